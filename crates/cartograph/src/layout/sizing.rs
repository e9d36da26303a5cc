//! Node box sizes.

use log::debug;

use cartograph_core::{
    ast::NodeAst,
    geometry::Size,
    shape::{Anchor, CARDINAL_ANCHORS, FALLBACK_SIZE, ShapeRegistry},
    text::{DEFAULT_FONT_SIZE, TextMeasure},
};

/// Reads a positive finite number from node data.
fn positive_number(node: &NodeAst, key: &str) -> Option<f32> {
    node.data
        .get(key)
        .and_then(|value| value.as_number())
        .filter(|n| n.is_finite() && *n > 0.0)
}

/// Size of the box a node occupies.
///
/// Starts from the shape's default size (or [`FALLBACK_SIZE`] for unknown
/// shapes), grows to fit the measured label plus the shape's label padding,
/// and finally applies explicit `width` / `height` data.
pub fn node_size(node: &NodeAst, shapes: &ShapeRegistry, measure: &dyn TextMeasure) -> Size {
    let (default_size, padding) = match shapes.resolve(&node.shape) {
        Some(shape) => (shape.default_size(), shape.label_padding()),
        None => {
            debug!(node = node.id.as_str(), shape = node.shape.as_str(); "Unknown shape, using fallback size");
            (FALLBACK_SIZE, Default::default())
        }
    };

    let font_size = positive_number(node, "font_size").unwrap_or(DEFAULT_FONT_SIZE);
    let label = measure.measure(node.display_label(), font_size);
    let label = if label.width().is_finite() && label.height().is_finite() {
        label.add_padding(padding)
    } else {
        Size::default()
    };

    let mut size = sanitize(default_size).max(sanitize(label));
    if let Some(width) = positive_number(node, "width") {
        size = Size::new(width, size.height());
    }
    if let Some(height) = positive_number(node, "height") {
        size = Size::new(size.width(), height);
    }
    size
}

/// Connection points of a node; shapes without anchors get the cardinal ones.
pub fn node_anchors<'a>(node: &NodeAst, shapes: &'a ShapeRegistry) -> &'a [Anchor] {
    match shapes.resolve(&node.shape).map(|shape| shape.anchors()) {
        Some(anchors) if !anchors.is_empty() => anchors,
        _ => &CARDINAL_ANCHORS,
    }
}

fn sanitize(size: Size) -> Size {
    let clean = |v: f32| if v.is_finite() && v > 0.0 { v } else { 0.0 };
    Size::new(clean(size.width()), clean(size.height()))
}

#[cfg(test)]
mod tests {
    use cartograph_core::{ast::DataValue, text::ApproximateTextMeasure};

    use super::*;

    struct BrokenMeasure;

    impl TextMeasure for BrokenMeasure {
        fn measure(&self, _text: &str, _font_size: f32) -> Size {
            Size::new(f32::NAN, f32::INFINITY)
        }
    }

    #[test]
    fn test_unknown_shape_uses_fallback() {
        let shapes = ShapeRegistry::with_builtins();
        let node = NodeAst::new("a", "hexagram");
        let size = node_size(&node, &shapes, &ApproximateTextMeasure::default());
        assert_eq!(size, FALLBACK_SIZE);
    }

    #[test]
    fn test_long_label_widens_node() {
        let shapes = ShapeRegistry::with_builtins();
        let measure = ApproximateTextMeasure::default();
        let short = node_size(&NodeAst::new("a", "rectangle"), &shapes, &measure);
        let long = node_size(
            &NodeAst::new("a", "rectangle").with_label("A label that is far too long for the box"),
            &shapes,
            &measure,
        );
        assert!(long.width() > short.width());
        assert_eq!(long.height(), short.height());
    }

    #[test]
    fn test_data_overrides_size() {
        let shapes = ShapeRegistry::with_builtins();
        let mut node = NodeAst::new("a", "rectangle");
        node.data.insert("width".to_string(), DataValue::Number(300.0));
        node.data.insert("height".to_string(), DataValue::Number(-5.0));
        let size = node_size(&node, &shapes, &ApproximateTextMeasure::default());
        assert_eq!(size.width(), 300.0);
        assert!(size.height() > 0.0);
    }

    #[test]
    fn test_broken_measure_stays_finite() {
        let shapes = ShapeRegistry::with_builtins();
        let size = node_size(&NodeAst::new("a", "rectangle"), &shapes, &BrokenMeasure);
        assert!(size.width().is_finite() && size.height().is_finite());
        assert!(size.width() > 0.0);
    }

    #[test]
    fn test_unknown_shape_has_cardinal_anchors() {
        let shapes = ShapeRegistry::with_builtins();
        let anchors = node_anchors(&NodeAst::new("a", "hexagram"), &shapes);
        let names: Vec<_> = anchors.iter().map(Anchor::name).collect();
        assert_eq!(names, ["north", "east", "south", "west"]);
    }
}
