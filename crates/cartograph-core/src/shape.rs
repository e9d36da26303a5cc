//! Shape catalog contract.
//!
//! Nodes reference shapes by a bare string. The [`ShapeRegistry`] resolves
//! those strings (including aliases such as `rect` or `db`) to a
//! [`ShapeDefinition`] that tells layout how large a node is by default and
//! where edges may attach to it. Path generation lives with the renderer.
//!
//! The registry is an explicit value passed to the stages that need it;
//! there is no process-wide catalog.

use std::{borrow::Cow, fmt};

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use crate::geometry::{Bounds, Insets, Point, Size};

/// Size used for shapes the registry does not know.
pub const FALLBACK_SIZE: Size = Size::new(120.0, 60.0);

/// A named connection point on a shape boundary, in coordinates relative to
/// the shape's bounding box (`0.0..=1.0` on both axes).
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    name: Cow<'static, str>,
    rel_x: f32,
    rel_y: f32,
}

impl Anchor {
    pub const fn new_static(name: &'static str, rel_x: f32, rel_y: f32) -> Self {
        Self {
            name: Cow::Borrowed(name),
            rel_x,
            rel_y,
        }
    }

    pub fn new(name: impl Into<String>, rel_x: f32, rel_y: f32) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            rel_x,
            rel_y,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute position of this anchor on a node occupying `bounds`.
    pub fn position(&self, bounds: Bounds) -> Point {
        Point::new(
            bounds.min_x() + bounds.width() * self.rel_x,
            bounds.min_y() + bounds.height() * self.rel_y,
        )
    }

    /// Unit-ish outward direction of the anchor, used to start orthogonal routes.
    pub fn outward(&self) -> Point {
        Point::new(self.rel_x - 0.5, self.rel_y - 0.5)
    }
}

/// Midpoints of the four sides: `north`, `east`, `south`, `west`.
pub static CARDINAL_ANCHORS: [Anchor; 4] = [
    Anchor::new_static("north", 0.5, 0.0),
    Anchor::new_static("east", 1.0, 0.5),
    Anchor::new_static("south", 0.5, 1.0),
    Anchor::new_static("west", 0.0, 0.5),
];

/// The contract every shape in the catalog fulfils.
pub trait ShapeDefinition: fmt::Debug + Send + Sync {
    /// Canonical shape id, e.g. `rectangle`.
    fn id(&self) -> &str;

    /// Size of a node using this shape before its label is taken into account.
    fn default_size(&self) -> Size;

    /// Space kept between the label and the shape outline.
    fn label_padding(&self) -> Insets {
        Insets::symmetric(12.0, 8.0)
    }

    /// Connection points edges may attach to.
    fn anchors(&self) -> &[Anchor] {
        &CARDINAL_ANCHORS
    }
}

/// A shape described purely by data.
#[derive(Debug, Clone)]
pub struct BasicShape {
    id: String,
    default_size: Size,
    label_padding: Insets,
    anchors: Option<Vec<Anchor>>,
}

impl BasicShape {
    pub fn new(id: impl Into<String>, default_size: Size) -> Self {
        Self {
            id: id.into(),
            default_size,
            label_padding: Insets::symmetric(12.0, 8.0),
            anchors: None,
        }
    }

    pub fn with_label_padding(mut self, padding: Insets) -> Self {
        self.label_padding = padding;
        self
    }

    pub fn with_anchors(mut self, anchors: Vec<Anchor>) -> Self {
        self.anchors = Some(anchors);
        self
    }
}

impl ShapeDefinition for BasicShape {
    fn id(&self) -> &str {
        &self.id
    }

    fn default_size(&self) -> Size {
        self.default_size
    }

    fn label_padding(&self) -> Insets {
        self.label_padding
    }

    fn anchors(&self) -> &[Anchor] {
        self.anchors.as_deref().unwrap_or(&CARDINAL_ANCHORS)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("cannot register alias `{alias}`: shape `{canonical}` does not exist")]
    UnknownShape { alias: String, canonical: String },

    #[error("cannot register alias `{0}`: a shape with that id already exists")]
    AliasShadowsShape(String),
}

/// Shape catalog with alias resolution.
#[derive(Debug, Default)]
pub struct ShapeRegistry {
    shapes: IndexMap<String, Box<dyn ShapeDefinition>>,
    aliases: IndexMap<String, String>,
}

impl ShapeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry populated with the built-in shapes and aliases.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.install_builtins();
        registry
    }

    /// Restores the built-in catalog, dropping every custom shape and alias.
    pub fn reset(&mut self) {
        self.clear();
        self.install_builtins();
    }

    /// Removes every shape and alias.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.aliases.clear();
    }

    /// Adds or replaces a shape.
    pub fn register(&mut self, shape: Box<dyn ShapeDefinition>) -> &mut Self {
        let id = shape.id().to_string();
        debug!(shape = id.as_str(); "Registering shape");
        self.shapes.insert(id, shape);
        self
    }

    /// Registers `alias` as another name for `canonical`.
    ///
    /// `canonical` may itself be an alias. Fails when it names nothing.
    pub fn register_alias(
        &mut self,
        alias: impl Into<String>,
        canonical: &str,
    ) -> Result<(), RegistryError> {
        let alias = alias.into();
        if self.shapes.contains_key(&alias) {
            return Err(RegistryError::AliasShadowsShape(alias));
        }
        let Some(target) = self.canonical_id(canonical).map(str::to_string) else {
            return Err(RegistryError::UnknownShape {
                alias,
                canonical: canonical.to_string(),
            });
        };
        self.aliases.insert(alias, target);
        Ok(())
    }

    /// Resolves a shape id or alias to its canonical id.
    pub fn canonical_id<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if let Some((id, _)) = self.shapes.get_key_value(name) {
            return Some(id);
        }
        self.aliases.get(name).map(String::as_str)
    }

    /// Resolves a shape id or alias to its definition.
    pub fn resolve(&self, name: &str) -> Option<&dyn ShapeDefinition> {
        let id = self.canonical_id(name)?;
        self.shapes.get(id).map(|shape| shape.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.canonical_id(name).is_some()
    }

    /// Every name the registry accepts: canonical ids first, then aliases.
    pub fn names(&self) -> Vec<&str> {
        self.shapes
            .keys()
            .chain(self.aliases.keys())
            .map(String::as_str)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    fn install_builtins(&mut self) {
        const BUILTIN: &[(&str, f32, f32)] = &[
            ("rectangle", 120.0, 60.0),
            ("rounded", 120.0, 60.0),
            ("circle", 80.0, 80.0),
            ("ellipse", 120.0, 70.0),
            ("diamond", 110.0, 80.0),
            ("hexagon", 120.0, 70.0),
            ("cylinder", 100.0, 80.0),
            ("parallelogram", 130.0, 60.0),
            ("trapezoid", 130.0, 60.0),
            ("triangle", 100.0, 90.0),
            ("document", 120.0, 70.0),
            ("cloud", 140.0, 90.0),
            ("actor", 60.0, 90.0),
            ("note", 120.0, 70.0),
            ("stadium", 130.0, 50.0),
            ("octagon", 90.0, 90.0),
        ];
        const ALIASES: &[(&str, &str)] = &[
            ("rect", "rectangle"),
            ("box", "rectangle"),
            ("db", "cylinder"),
            ("database", "cylinder"),
            ("oval", "ellipse"),
            ("rhombus", "diamond"),
            ("decision", "diamond"),
            ("person", "actor"),
            ("pill", "stadium"),
        ];

        for &(id, width, height) in BUILTIN {
            self.register(Box::new(BasicShape::new(id, Size::new(width, height))));
        }
        for &(alias, canonical) in ALIASES {
            // Built-in targets are installed just above.
            if let Some(target) = self.canonical_id(canonical).map(str::to_string) {
                self.aliases.insert(alias.to_string(), target);
            }
        }
    }
}
