//! Merging generated diagram drafts into the editor state.
//!
//! The flow for one generation request is:
//!
//! 1. [`build_context_prompt`] describes the current diagram to the model,
//!    so it only generates what is new and refers to existing classes by
//!    name.
//! 2. The reply is parsed into a [`DraftDiagram`] by
//!    [`umlcanvas_parser::parse_model_output`].
//! 3. [`merge_draft`] places the new classes with [`place_shapes`], resolves
//!    connection endpoints to shape ids, drops connections that still do not
//!    point at two distinct shapes, and appends the rest.
//!
//! Merging only ever adds; existing shapes and connections are untouched.

use std::fmt;

use log::{debug, info, warn};
use serde_json::{Value, json};

use umlcanvas_core::{
    geometry::{Bounds, Point, Size},
    semantic::{
        ClassShape, Connection, ConnectionId, DEFAULT_SHAPE_WIDTH, DraftConnection,
        DraftDiagram, MIN_SHAPE_HEIGHT, RelationKind, SHAPE_ID_PREFIX, ShapeId,
    },
};

use crate::store::DiagramStore;

/// Opening line of the context block sent with follow-up requests.
pub const CONTEXT_HEADER: &str = "CURRENT DIAGRAM CONTEXT:";
/// Marker in front of the user's request inside a context block.
pub const REQUEST_HEADER: &str = "NEW USER REQUEST:";

const CONTEXT_INSTRUCTIONS: &str = "IMPORTANT:
- Generate ONLY the newly requested classes
- Do NOT regenerate the existing classes
- To relate a new class to an existing one, use the existing class's exact name
- Keep the result consistent with the current design";

/// Distance kept from the right canvas edge before wrapping to a new row.
const RIGHT_EDGE_ALLOWANCE: f32 = 300.0;

/// Builds the prompt for `request` given the current diagram.
///
/// With an empty diagram the request is returned unchanged. Otherwise the
/// prompt starts with [`CONTEXT_HEADER`] and a JSON summary of the existing
/// classes and relations, followed by the request and instructions to
/// generate only new classes.
pub fn build_context_prompt(store: &DiagramStore, request: &str) -> String {
    if store.shapes().is_empty() {
        return request.to_string();
    }

    let classes: Vec<Value> = store
        .shapes()
        .iter()
        .map(|shape| {
            json!({
                "name": shape.name,
                "is_abstract": shape.is_abstract,
                "is_interface": shape.is_interface,
                "stereotype": shape.stereotype,
                "attributes": shape.fields.iter().map(|f| f.signature()).collect::<Vec<_>>(),
                "methods": shape.methods.iter().map(|m| m.signature()).collect::<Vec<_>>(),
            })
        })
        .collect();

    let name_of = |id: &str| store.shape(id).map(|shape| shape.name.clone());
    let relations: Vec<Value> = store
        .connections()
        .iter()
        .map(|connection| {
            json!({
                "from": name_of(&connection.from_id),
                "to": name_of(&connection.to_id),
                "kind": connection.kind.as_str(),
                "multiplicity": connection.label,
            })
        })
        .collect();

    let payload = json!({
        "existing_classes": classes,
        "existing_relations": relations,
    });

    format!(
        "{CONTEXT_HEADER}\n{payload:#}\n\n{REQUEST_HEADER} {request}\n\n{CONTEXT_INSTRUCTIONS}"
    )
}

/// Grid used to place generated classes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementConfig {
    /// Usable canvas width; rows wrap before the right edge.
    pub canvas_width: f32,
    /// Shapes per row of the initial grid.
    pub columns: usize,
    /// Offset of the first cell from the canvas origin.
    pub margin: f32,
    pub column_spacing: f32,
    pub row_spacing: f32,
    /// Two top-left corners closer than this on both axes overlap.
    pub overlap: Size,
    /// Nudges tried before a position is accepted as is.
    pub max_attempts: usize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1200.0,
            columns: 3,
            margin: 50.0,
            column_spacing: 250.0,
            row_spacing: 200.0,
            overlap: Size::new(200.0, 150.0),
            max_attempts: 50,
        }
    }
}

/// Chooses top-left positions for `count` new shapes.
///
/// Shape `i` starts at grid cell `(i % columns, i / columns)`. While it
/// overlaps an existing or already placed shape it moves one column right,
/// wrapping to the next row near the right edge. After
/// [`PlacementConfig::max_attempts`] nudges the position is taken as is.
///
/// ```
/// # use umlcanvas::merge::{place_shapes, PlacementConfig};
/// # use umlcanvas::geometry::{Bounds, Point, Size};
/// let config = PlacementConfig::default();
/// let taken = [Bounds::new_from_top_left(Point::new(50.0, 50.0), Size::new(200.0, 120.0))];
///
/// let positions = place_shapes(&taken, 1, &config);
/// assert_eq!(positions, [Point::new(300.0, 50.0)]);
/// ```
pub fn place_shapes(existing: &[Bounds], count: usize, config: &PlacementConfig) -> Vec<Point> {
    let columns = config.columns.max(1);
    let wrap_at = config.canvas_width - RIGHT_EDGE_ALLOWANCE;
    let footprint = Size::new(DEFAULT_SHAPE_WIDTH, MIN_SHAPE_HEIGHT);

    let mut occupied = existing.to_vec();
    let mut placed = Vec::with_capacity(count);

    for index in 0..count {
        let mut x = (index % columns) as f32 * config.column_spacing + config.margin;
        let mut y = (index / columns) as f32 * config.row_spacing + config.margin;

        for _ in 0..config.max_attempts {
            let candidate = Bounds::new_from_top_left(Point::new(x, y), footprint);
            let blocked = occupied
                .iter()
                .any(|other| candidate.overlaps_within(other, config.overlap));
            if !blocked {
                break;
            }
            x += config.column_spacing;
            if x > wrap_at {
                x = config.margin;
                y += config.row_spacing;
            }
        }

        let position = Point::new(x, y);
        occupied.push(Bounds::new_from_top_left(position, footprint));
        placed.push(position);
    }

    placed
}

/// Why a generated connection was not merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// An endpoint names neither an existing nor a generated class.
    MissingEndpoint,
    /// Both endpoints resolve to the same class.
    SelfLoop,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEndpoint => write!(f, "missing endpoint"),
            Self::SelfLoop => write!(f, "self-loop"),
        }
    }
}

/// A generated connection left out of the merge, with its endpoints after
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedConnection {
    pub from: String,
    pub to: String,
    pub kind: RelationKind,
    pub reason: DropReason,
}

/// What a merge added and what it left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added_shapes: Vec<ShapeId>,
    pub added_connections: Vec<ConnectionId>,
    pub dropped_connections: Vec<DroppedConnection>,
}

impl MergeReport {
    pub fn is_empty(&self) -> bool {
        self.added_shapes.is_empty() && self.added_connections.is_empty()
    }
}

/// Resolves an endpoint reference to a shape id.
///
/// References starting with `class-` are taken as ids. Other references are
/// class names, matched against the shapes that existed before the merge
/// first and the generated ones second. Unknown names are returned as is.
fn resolve_endpoint(reference: &str, existing: &[ClassShape], generated: &[ClassShape]) -> String {
    if reference.starts_with(SHAPE_ID_PREFIX) {
        return reference.to_string();
    }
    existing
        .iter()
        .chain(generated)
        .find(|shape| shape.name == reference)
        .map_or_else(|| reference.to_string(), |shape| shape.id.clone())
}

fn build_connection(draft: &DraftConnection, from: String, to: String) -> Connection {
    let mut connection = Connection::new(from, to, draft.kind).with_label(draft.effective_label());
    connection.from_multiplicity = draft.from_multiplicity.clone().filter(|m| !m.is_empty());
    connection.to_multiplicity = draft.to_multiplicity.clone().filter(|m| !m.is_empty());
    connection
}

/// Appends `draft` to `store`.
///
/// New classes get fresh ids and positions from [`place_shapes`]; their
/// heights follow their content. Connections are resolved as described on
/// the module and validated: self-loops and references to unknown classes
/// are dropped, logged, and listed in the report. Many-to-many connections
/// are kept as single connections.
pub fn merge_draft(
    store: &mut DiagramStore,
    draft: DraftDiagram,
    config: &PlacementConfig,
) -> MergeReport {
    let mut report = MergeReport::default();

    let existing_count = store.shapes().len();
    let occupied: Vec<Bounds> = store.shapes().iter().map(ClassShape::bounds).collect();
    let positions = place_shapes(&occupied, draft.classes.len(), config);

    for (class, position) in draft.classes.into_iter().zip(positions) {
        let mut shape = ClassShape::new(class.name, position);
        shape.is_abstract = class.is_abstract;
        shape.is_interface = class.is_interface;
        shape.stereotype = class.stereotype;
        shape.fields = class.fields;
        shape.methods = class.methods;
        shape.recompute_height();
        report.added_shapes.push(store.add_shape(shape));
    }

    let (existing, generated) = store.shapes().split_at(existing_count);
    let resolved: Vec<(String, String)> = draft
        .connections
        .iter()
        .map(|connection| {
            (
                resolve_endpoint(&connection.from, existing, generated),
                resolve_endpoint(&connection.to, existing, generated),
            )
        })
        .collect();

    for (connection, (from, to)) in draft.connections.iter().zip(resolved) {
        let reason = if from == to {
            Some(DropReason::SelfLoop)
        } else if store.shape(&from).is_none() || store.shape(&to).is_none() {
            Some(DropReason::MissingEndpoint)
        } else {
            None
        };

        if let Some(reason) = reason {
            warn!(
                from = from.as_str(),
                to = to.as_str(),
                kind = connection.kind.as_str(),
                reason:% = reason;
                "Dropping generated connection"
            );
            report.dropped_connections.push(DroppedConnection {
                from,
                to,
                kind: connection.kind,
                reason,
            });
            continue;
        }

        debug!(from = from.as_str(), to = to.as_str(); "Merging generated connection");
        if let Some(id) = store.insert_connection(build_connection(connection, from, to)) {
            report.added_connections.push(id);
        }
    }

    info!(
        shapes = report.added_shapes.len(),
        connections = report.added_connections.len(),
        dropped = report.dropped_connections.len();
        "Draft merged"
    );
    report
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn existing_bounds() -> impl Strategy<Value = Vec<Bounds>> {
        prop::collection::vec((0.0f32..1000.0, 0.0f32..1000.0), 0..8).prop_map(|corners| {
            corners
                .into_iter()
                .map(|(x, y)| Bounds::new_from_top_left(Point::new(x, y), Size::new(200.0, 120.0)))
                .collect()
        })
    }

    fn overlaps(a: Point, b: Point, config: &PlacementConfig) -> bool {
        (a.x() - b.x()).abs() < config.overlap.width()
            && (a.y() - b.y()).abs() < config.overlap.height()
    }

    fn check_placement_never_overlaps(
        existing: &[Bounds],
        count: usize,
    ) -> Result<(), TestCaseError> {
        let config = PlacementConfig::default();
        let placed = place_shapes(existing, count, &config);
        prop_assert_eq!(placed.len(), count);

        for (i, position) in placed.iter().enumerate() {
            for other in existing {
                prop_assert!(
                    !overlaps(*position, other.min_point(), &config),
                    "placed {:?} overlaps existing {:?}",
                    position,
                    other
                );
            }
            for other in &placed[..i] {
                prop_assert!(!overlaps(*position, *other, &config));
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn placement_never_overlaps(existing in existing_bounds(), count in 1usize..10) {
            check_placement_never_overlaps(&existing, count)?;
        }
    }
}
