use cartograph::{
    ast::{DiagramAst, EdgeAst, LayoutAlgorithm, NodeAst},
    geometry::Point,
    layout::{LayoutOptions, layout},
    metrics::{MetricsOptions, compute_metrics},
};
use proptest::prelude::*;

fn diagram(count: usize, pairs: &[(usize, usize)], algorithm: LayoutAlgorithm) -> DiagramAst {
    let nodes = (0..count)
        .map(|i| NodeAst::new(format!("n{i}"), "rectangle"))
        .collect();
    let edges = pairs
        .iter()
        .map(|&(from, to)| EdgeAst::new(format!("n{}", from % count), format!("n{}", to % count)))
        .collect();
    let mut diagram = DiagramAst::from_parts(nodes, edges);
    diagram.algorithm = Some(algorithm);
    diagram
}

fn algorithm() -> impl Strategy<Value = LayoutAlgorithm> {
    prop_oneof![
        Just(LayoutAlgorithm::Hierarchical),
        Just(LayoutAlgorithm::Circular),
        Just(LayoutAlgorithm::Force),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn layout_places_every_node_inside_the_canvas(
        count in 1usize..10,
        pairs in prop::collection::vec((0usize..10, 0usize..10), 0..16),
        algorithm in algorithm(),
    ) {
        let diagram = diagram(count, &pairs, algorithm);
        let options = LayoutOptions::default();
        let outcome = layout(&diagram, &options).expect("layout should succeed");
        let laid_out = outcome.diagram;

        prop_assert_eq!(laid_out.nodes.len(), count);
        prop_assert_eq!(laid_out.edges.len(), pairs.len());
        for (i, node) in laid_out.nodes.iter().enumerate() {
            let id = format!("n{i}");
            prop_assert_eq!(node.id(), id.as_str());
            prop_assert!(node.x.is_finite() && node.y.is_finite());
            prop_assert!(node.x >= options.padding - 1e-3);
            prop_assert!(node.y >= options.padding - 1e-3);
            prop_assert!(node.x + node.width <= laid_out.size.width() + 1e-3);
            prop_assert!(node.y + node.height <= laid_out.size.height() + 1e-3);
        }
        for edge in &laid_out.edges {
            prop_assert!(edge.is_routed());
            prop_assert!(edge.points.iter().all(|point| point.is_finite()));
        }
    }

    #[test]
    fn circular_orbit_respects_min_radius(count in 2usize..10) {
        let diagram = diagram(count, &[], LayoutAlgorithm::Circular);
        let options = LayoutOptions::default();
        let laid_out = layout(&diagram, &options).expect("layout should succeed").diagram;

        let centers: Vec<Point> = laid_out.nodes.iter().map(|node| node.center()).collect();
        let middle = centers
            .iter()
            .fold(Point::default(), |acc, center| acc.add_point(*center))
            .scale(1.0 / count as f32);
        for center in &centers {
            prop_assert!(center.distance(middle) >= options.circular.min_radius - 1e-2);
        }
    }

    #[test]
    fn metrics_stay_in_range(
        count in 1usize..8,
        pairs in prop::collection::vec((0usize..8, 0usize..8), 0..14),
    ) {
        let diagram = diagram(count, &pairs, LayoutAlgorithm::Hierarchical);
        let options = MetricsOptions { all_nodes: true, ..MetricsOptions::default() };
        let outcome = compute_metrics(&diagram, &options);

        prop_assert!(outcome.complete);
        prop_assert_eq!(outcome.metrics.len(), count);
        for metrics in outcome.metrics.values() {
            for value in [metrics.betweenness, metrics.closeness, metrics.clustering].into_iter().flatten() {
                prop_assert!((0.0..=1.0 + 1e-9).contains(&value));
            }
        }
    }
}
