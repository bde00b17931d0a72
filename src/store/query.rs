//! Parameterized layer query construction.
//!
//! A [`LayerQuery`] pairs one registry [`Layer`] with the envelope of the
//! requested tile. Table and layer identifiers come only from the registry,
//! and the query text is assembled inside this module; the envelope bounds
//! never appear in the text and are bound as `$1..$5` instead.
//!
//! ```text
//! bounds   : densified envelope in EPSG:3857 and its box2d
//! mvtgeom  : published rows intersecting the bounds (compared in EPSG:4326),
//!            reprojected and clipped into the 4096 tile grid
//! result   : ST_AsMVT(mvtgeom, '<layer name>')
//! ```

use super::layer::Layer;
use crate::tile::Envelope;

/// A ready-to-execute query for one layer of one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerQuery {
    layer: Layer,
    envelope: Envelope,
}

impl LayerQuery {
    pub fn new(layer: Layer, envelope: &Envelope) -> Self {
        Self {
            layer,
            envelope: *envelope,
        }
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Bound parameters in placeholder order: xmin, ymin, xmax, ymax, seg_size.
    pub fn params(&self) -> [f64; 5] {
        [
            self.envelope.xmin,
            self.envelope.ymin,
            self.envelope.xmax,
            self.envelope.ymax,
            self.envelope.seg_size,
        ]
    }

    /// SQL text for this layer.
    ///
    /// Depends only on the layer, so the text is identical for every tile.
    pub fn sql(&self) -> String {
        format!(
            r#"WITH
"bounds" AS (
    SELECT ST_Segmentize(ST_MakeEnvelope($1, $2, $3, $4, 3857), $5) AS "geom",
           ST_Segmentize(ST_MakeEnvelope($1, $2, $3, $4, 3857), $5)::box2d AS "b2d"
),
"mvtgeom" AS (
    SELECT ST_AsMVTGeom(ST_Transform("t"."geom", 3857), "bounds"."b2d") AS "geom",
           "id", "name", "weight", "theme_id", "tag_str"
    FROM {table} "t", "bounds"
    WHERE ST_Intersects("t"."geom", ST_Transform("bounds"."geom", 4326)) AND "published" = TRUE
)
SELECT ST_AsMVT("mvtgeom".*, {layer_name}) FROM "mvtgeom""#,
            table = quote_identifier(self.layer.source()),
            layer_name = quote_literal(self.layer.name()),
        )
    }
}

fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
