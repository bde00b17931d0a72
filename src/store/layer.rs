//! Fixed registry of the feature layers served in every tile.

use std::fmt;

/// A feature layer.
///
/// The set is closed: every tile carries exactly these layers, in the order
/// of [`LAYERS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Points,
    Lines,
    Polygons,
}

impl Layer {
    /// Layer name written into the tile.
    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    /// Backing table in the spatial store.
    pub fn source(&self) -> &'static str {
        self.spec().source
    }

    fn spec(&self) -> &'static LayerSpec {
        match self {
            Layer::Points => &LAYERS[0],
            Layer::Lines => &LAYERS[1],
            Layer::Polygons => &LAYERS[2],
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static description of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerSpec {
    pub layer: Layer,
    pub name: &'static str,
    pub source: &'static str,
}

/// All layers, in tile order.
pub const LAYERS: [LayerSpec; 3] = [
    LayerSpec {
        layer: Layer::Points,
        name: "points",
        source: "mmt_map_point",
    },
    LayerSpec {
        layer: Layer::Lines,
        name: "lines",
        source: "mmt_map_line",
    },
    LayerSpec {
        layer: Layer::Polygons,
        name: "polygons",
        source: "mmt_map_polygon",
    },
];

/// Iterate the layers in tile order.
pub fn layers() -> impl Iterator<Item = Layer> {
    LAYERS.iter().map(|spec| spec.layer)
}
