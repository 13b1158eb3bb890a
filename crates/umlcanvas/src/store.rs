//! In-memory editor state for one class diagram.
//!
//! [`DiagramStore`] owns every [`ClassShape`] and [`Connection`] of the
//! diagram being edited. Connections refer to shapes by id only; removing a
//! shape removes every connection touching it.
//!
//! All operations addressing a missing id are no-ops that report the miss
//! through their return value (`false` or `None`).
//!
//! # Example
//!
//! ```
//! # use umlcanvas::store::DiagramStore;
//! # use umlcanvas::semantic::RelationKind;
//! # use umlcanvas::geometry::Point;
//! let mut store = DiagramStore::new();
//! let student = store.create_shape("Student", Point::new(0.0, 0.0));
//! let course = store.create_shape("Course", Point::new(400.0, 0.0));
//!
//! // A many-to-many link becomes a junction class and two one-to-many links
//! store.add_connection(&student, &course, RelationKind::ManyToMany);
//! assert_eq!(store.shapes().len(), 3);
//! assert_eq!(store.connections().len(), 2);
//! ```

use log::{debug, info, warn};
use serde::Serialize;

use umlcanvas_core::{
    geometry::Point,
    semantic::{
        CONNECTION_ID_PREFIX, ClassShape, Connection, ConnectionId, DEFAULT_SHAPE_WIDTH, Diagram,
        Field, Method, RelationKind, SHAPE_ID_PREFIX, ShapeId, Visibility,
    },
};

/// Vertical offset of a junction class above the midpoint of its two ends.
const JUNCTION_LIFT: f32 = 100.0;

/// The current selection; a shape and a connection are never selected at
/// the same time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Shape(ShapeId),
    Connection(ConnectionId),
}

/// Partial update of a shape. `None` leaves the property unchanged.
///
/// When `fields` or `methods` change and no explicit `height` is given, the
/// height is derived from the new content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeUpdate {
    pub name: Option<String>,
    pub is_abstract: Option<bool>,
    pub is_interface: Option<bool>,
    pub stereotype: Option<Option<String>>,
    pub position: Option<Point>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub fields: Option<Vec<Field>>,
    pub methods: Option<Vec<Method>>,
}

impl ShapeUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Partial update of a connection. Endpoints cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionUpdate {
    pub kind: Option<RelationKind>,
    pub label: Option<String>,
    pub from_multiplicity: Option<Option<String>>,
    pub to_multiplicity: Option<Option<String>>,
}

/// Counts describing the current diagram.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramStats {
    pub total_classes: usize,
    pub total_connections: usize,
    pub intermediate_classes: usize,
    pub regular_classes: usize,
    pub total_fields: usize,
    pub total_methods: usize,
    pub one_to_one: usize,
    pub one_to_many: usize,
    pub many_to_many: usize,
}

/// Saved snapshots with a cursor on the current one.
#[derive(Debug, Default)]
struct History {
    snapshots: Vec<Diagram>,
    cursor: Option<usize>,
}

/// Owner of the shapes and connections of the diagram being edited.
#[derive(Debug)]
pub struct DiagramStore {
    name: Option<String>,
    shapes: Vec<ClassShape>,
    connections: Vec<Connection>,
    selection: Selection,
    next_shape: u64,
    next_connection: u64,
    history: History,
}

impl Default for DiagramStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramStore {
    pub fn new() -> Self {
        Self {
            name: None,
            shapes: Vec::new(),
            connections: Vec::new(),
            selection: Selection::None,
            next_shape: 1,
            next_connection: 1,
            history: History::default(),
        }
    }

    /// A store holding `diagram`.
    pub fn from_diagram(diagram: Diagram) -> Self {
        let mut store = Self::new();
        store.load(diagram);
        store
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn shapes(&self) -> &[ClassShape] {
        &self.shapes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.connections.is_empty()
    }

    pub fn shape(&self, id: &str) -> Option<&ClassShape> {
        self.shapes.iter().find(|shape| shape.id == id)
    }

    /// First shape named exactly `name`.
    pub fn shape_by_name(&self, name: &str) -> Option<&ClassShape> {
        self.shapes.iter().find(|shape| shape.name == name)
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|connection| connection.id == id)
    }

    /// Connections with `shape_id` at either end.
    pub fn connections_of(&self, shape_id: &str) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|connection| connection.touches(shape_id))
            .collect()
    }

    fn shape_mut(&mut self, id: &str) -> Option<&mut ClassShape> {
        self.shapes.iter_mut().find(|shape| shape.id == id)
    }

    fn connection_mut(&mut self, id: &str) -> Option<&mut Connection> {
        self.connections
            .iter_mut()
            .find(|connection| connection.id == id)
    }

    fn fresh_shape_id(&mut self) -> ShapeId {
        loop {
            let id = format!("{SHAPE_ID_PREFIX}{}", self.next_shape);
            self.next_shape += 1;
            if self.shape(&id).is_none() {
                return id;
            }
        }
    }

    fn fresh_connection_id(&mut self) -> ConnectionId {
        loop {
            let id = format!("{CONNECTION_ID_PREFIX}{}", self.next_connection);
            self.next_connection += 1;
            if self.connection(&id).is_none() {
                return id;
            }
        }
    }

    /// Adds `shape`, assigning a fresh `class-N` id when its id is empty or
    /// already taken.
    pub fn add_shape(&mut self, mut shape: ClassShape) -> ShapeId {
        if shape.id.is_empty() || self.shape(&shape.id).is_some() {
            shape.id = self.fresh_shape_id();
        }
        let id = shape.id.clone();
        debug!(shape_id = id.as_str(), name = shape.name.as_str(); "Shape added");
        self.shapes.push(shape);
        id
    }

    /// Adds a class from the default template: one private `id: int` field
    /// and one public `method(): void`.
    pub fn create_shape(&mut self, name: impl Into<String>, position: Point) -> ShapeId {
        let mut shape = ClassShape::new(name, position)
            .with_field(Field::new(Visibility::Private, "id", "int"))
            .with_method(Method::new(Visibility::Public, "method", "void"));
        shape.width = DEFAULT_SHAPE_WIDTH;
        self.add_shape(shape)
    }

    /// Applies `update` to the shape `id`. Returns `false` if there is no
    /// such shape.
    pub fn update_shape(&mut self, id: &str, update: ShapeUpdate) -> bool {
        let Some(shape) = self.shape_mut(id) else {
            return false;
        };

        let content_changed = update.fields.is_some() || update.methods.is_some();
        if let Some(name) = update.name {
            shape.name = name;
        }
        if let Some(is_abstract) = update.is_abstract {
            shape.is_abstract = is_abstract;
        }
        if let Some(is_interface) = update.is_interface {
            shape.is_interface = is_interface;
        }
        if let Some(stereotype) = update.stereotype {
            shape.stereotype = stereotype;
        }
        if let Some(position) = update.position {
            shape.set_position(position);
        }
        if let Some(width) = update.width {
            shape.width = width;
        }
        if let Some(fields) = update.fields {
            shape.fields = fields;
        }
        if let Some(methods) = update.methods {
            shape.methods = methods;
        }
        match update.height {
            Some(height) => shape.height = height,
            None if content_changed => shape.recompute_height(),
            None => {}
        }

        debug!(shape_id = id; "Shape updated");
        true
    }

    pub fn move_shape(&mut self, id: &str, position: Point) -> bool {
        let Some(shape) = self.shape_mut(id) else {
            return false;
        };
        shape.set_position(position);
        debug!(shape_id = id, x = position.x(), y = position.y(); "Shape moved");
        true
    }

    /// Removes the shape `id` and every connection touching it.
    pub fn remove_shape(&mut self, id: &str) -> Option<ClassShape> {
        let index = self.shapes.iter().position(|shape| shape.id == id)?;
        let shape = self.shapes.remove(index);

        let before = self.connections.len();
        self.connections.retain(|connection| !connection.touches(id));
        let cascaded = before - self.connections.len();

        let selection_gone = match &self.selection {
            Selection::Shape(selected) => selected == id,
            Selection::Connection(selected) => self.connection(selected).is_none(),
            Selection::None => false,
        };
        if selection_gone {
            self.selection = Selection::None;
        }

        debug!(shape_id = id, cascaded; "Shape removed");
        Some(shape)
    }

    /// Connects two shapes with a relationship of `kind`.
    ///
    /// Self-loops and missing endpoints are rejected. A many-to-many link is
    /// replaced by a junction class named `{from}_{to}` holding one id field
    /// per end, linked to both ends by one-to-many connections; the id of the
    /// connection from `from` to the junction is returned.
    pub fn add_connection(
        &mut self,
        from_id: &str,
        to_id: &str,
        kind: RelationKind,
    ) -> Option<ConnectionId> {
        if from_id == to_id {
            warn!(shape_id = from_id; "Refusing to connect a class to itself");
            return None;
        }
        let from = self.shape(from_id)?.clone();
        let to = self.shape(to_id)?.clone();

        if kind == RelationKind::ManyToMany {
            return Some(self.add_junction(&from, &to));
        }

        self.insert_connection(Connection::new(from_id, to_id, kind))
    }

    fn add_junction(&mut self, from: &ClassShape, to: &ClassShape) -> ConnectionId {
        let position = from
            .position()
            .midpoint(to.position())
            .add_point(Point::new(0.0, -JUNCTION_LIFT));
        let mut junction = ClassShape::new(format!("{}_{}", from.name, to.name), position)
            .with_field(Field::new(
                Visibility::Public,
                format!("{}Id", from.name.to_lowercase()),
                "int",
            ))
            .with_field(Field::new(
                Visibility::Public,
                format!("{}Id", to.name.to_lowercase()),
                "int",
            ));
        junction.is_intermediate = true;

        let junction_id = self.add_shape(junction);
        info!(
            junction_id = junction_id.as_str(),
            from = from.id.as_str(),
            to = to.id.as_str();
            "Many-to-many link replaced by a junction class"
        );

        let label = RelationKind::OneToMany.default_label();
        let first = self.push_connection(
            Connection::new(from.id.as_str(), junction_id.as_str(), RelationKind::OneToMany)
                .with_label(label),
        );
        self.push_connection(
            Connection::new(to.id.as_str(), junction_id.as_str(), RelationKind::OneToMany)
                .with_label(label),
        );
        first
    }

    /// Adds a fully described connection, keeping its label and
    /// multiplicities. No junction is synthesized.
    ///
    /// Returns `None` for self-loops and missing endpoints.
    pub fn insert_connection(&mut self, connection: Connection) -> Option<ConnectionId> {
        if connection.from_id == connection.to_id
            || self.shape(&connection.from_id).is_none()
            || self.shape(&connection.to_id).is_none()
        {
            return None;
        }
        Some(self.push_connection(connection))
    }

    fn push_connection(&mut self, mut connection: Connection) -> ConnectionId {
        if connection.id.is_empty() || self.connection(&connection.id).is_some() {
            connection.id = self.fresh_connection_id();
        }
        let id = connection.id.clone();
        debug!(
            connection_id = id.as_str(),
            from = connection.from_id.as_str(),
            to = connection.to_id.as_str(),
            kind = connection.kind.as_str();
            "Connection added"
        );
        self.connections.push(connection);
        id
    }

    pub fn remove_connection(&mut self, id: &str) -> Option<Connection> {
        let index = self
            .connections
            .iter()
            .position(|connection| connection.id == id)?;
        if self.selection == Selection::Connection(id.to_string()) {
            self.selection = Selection::None;
        }
        debug!(connection_id = id; "Connection removed");
        Some(self.connections.remove(index))
    }

    pub fn update_connection(&mut self, id: &str, update: ConnectionUpdate) -> bool {
        let Some(connection) = self.connection_mut(id) else {
            return false;
        };
        if let Some(kind) = update.kind {
            connection.kind = kind;
        }
        if let Some(label) = update.label {
            connection.label = label;
        }
        if let Some(multiplicity) = update.from_multiplicity {
            connection.from_multiplicity = multiplicity;
        }
        if let Some(multiplicity) = update.to_multiplicity {
            connection.to_multiplicity = multiplicity;
        }
        debug!(connection_id = id; "Connection updated");
        true
    }

    /// Appends `field` to the shape and grows it.
    pub fn add_field(&mut self, shape_id: &str, field: Field) -> bool {
        let Some(shape) = self.shape_mut(shape_id) else {
            return false;
        };
        shape.fields.push(field);
        shape.recompute_height();
        true
    }

    pub fn remove_field(&mut self, shape_id: &str, index: usize) -> Option<Field> {
        let shape = self.shape_mut(shape_id)?;
        if index >= shape.fields.len() {
            return None;
        }
        let field = shape.fields.remove(index);
        shape.recompute_height();
        Some(field)
    }

    /// Appends `method` to the shape and grows it.
    pub fn add_method(&mut self, shape_id: &str, method: Method) -> bool {
        let Some(shape) = self.shape_mut(shape_id) else {
            return false;
        };
        shape.methods.push(method);
        shape.recompute_height();
        true
    }

    pub fn remove_method(&mut self, shape_id: &str, index: usize) -> Option<Method> {
        let shape = self.shape_mut(shape_id)?;
        if index >= shape.methods.len() {
            return None;
        }
        let method = shape.methods.remove(index);
        shape.recompute_height();
        Some(method)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selects a shape, deselecting any connection.
    pub fn select_shape(&mut self, id: &str) -> bool {
        if self.shape(id).is_none() {
            return false;
        }
        self.selection = Selection::Shape(id.to_string());
        true
    }

    /// Selects a connection, deselecting any shape.
    pub fn select_connection(&mut self, id: &str) -> bool {
        if self.connection(id).is_none() {
            return false;
        }
        self.selection = Selection::Connection(id.to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    pub fn selected_shape(&self) -> Option<&ClassShape> {
        match &self.selection {
            Selection::Shape(id) => self.shape(id),
            _ => None,
        }
    }

    pub fn selected_connection(&self) -> Option<&Connection> {
        match &self.selection {
            Selection::Connection(id) => self.connection(id),
            _ => None,
        }
    }

    /// Removes all shapes and connections. History is kept.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.connections.clear();
        self.selection = Selection::None;
        info!("Diagram cleared");
    }

    /// Replaces the contents with `diagram`.
    ///
    /// Shapes and connections without an id, or with a duplicate one, get a
    /// fresh id. Connections are kept as loaded even when an endpoint is
    /// missing; see [`DiagramStore::prune_dangling`].
    pub fn load(&mut self, diagram: Diagram) {
        self.shapes.clear();
        self.connections.clear();
        self.selection = Selection::None;
        self.name = diagram.name;

        for shape in diagram.classes {
            self.add_shape(shape);
        }
        for connection in diagram.connections {
            self.push_connection(connection);
        }

        info!(
            classes = self.shapes.len(),
            connections = self.connections.len();
            "Diagram loaded"
        );
    }

    /// A copy of the current contents.
    pub fn snapshot(&self) -> Diagram {
        Diagram {
            name: self.name.clone(),
            classes: self.shapes.clone(),
            connections: self.connections.clone(),
        }
    }

    fn restore(&mut self, diagram: Diagram) {
        self.name = diagram.name;
        self.shapes = diagram.classes;
        self.connections = diagram.connections;
        self.selection = Selection::None;
    }

    /// Records the current contents as a history entry, discarding any
    /// entries that were undone.
    pub fn save_state(&mut self) {
        let keep = self.history.cursor.map_or(0, |cursor| cursor + 1);
        self.history.snapshots.truncate(keep);
        self.history.snapshots.push(self.snapshot());
        self.history.cursor = Some(self.history.snapshots.len() - 1);
        debug!(entries = self.history.snapshots.len(); "State saved");
    }

    /// Records the current contents unless the current history entry
    /// already holds them. Returns whether an entry was added.
    pub fn save_state_if_changed(&mut self) -> bool {
        let current = self.snapshot();
        let saved = self
            .history
            .cursor
            .and_then(|cursor| self.history.snapshots.get(cursor));
        if saved == Some(&current) {
            return false;
        }
        self.save_state();
        true
    }

    /// Restores the history entry before the current one.
    pub fn undo(&mut self) -> bool {
        let Some(cursor) = self.history.cursor.filter(|&cursor| cursor > 0) else {
            return false;
        };
        let previous = cursor - 1;
        self.history.cursor = Some(previous);
        self.restore(self.history.snapshots[previous].clone());
        debug!(cursor = previous; "Undo");
        true
    }

    /// Restores the history entry after the current one.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        let next = self.history.cursor.map_or(0, |cursor| cursor + 1);
        self.history.cursor = Some(next);
        self.restore(self.history.snapshots[next].clone());
        debug!(cursor = next; "Redo");
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.cursor.is_some_and(|cursor| cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.history
            .cursor
            .is_some_and(|cursor| cursor + 1 < self.history.snapshots.len())
    }

    pub fn stats(&self) -> DiagramStats {
        let count_kind = |kind: RelationKind| {
            self.connections
                .iter()
                .filter(|connection| connection.kind == kind)
                .count()
        };
        let intermediate_classes = self
            .shapes
            .iter()
            .filter(|shape| shape.is_intermediate)
            .count();

        DiagramStats {
            total_classes: self.shapes.len(),
            total_connections: self.connections.len(),
            intermediate_classes,
            regular_classes: self.shapes.len() - intermediate_classes,
            total_fields: self.shapes.iter().map(|shape| shape.fields.len()).sum(),
            total_methods: self.shapes.iter().map(|shape| shape.methods.len()).sum(),
            one_to_one: count_kind(RelationKind::OneToOne),
            one_to_many: count_kind(RelationKind::OneToMany),
            many_to_many: count_kind(RelationKind::ManyToMany),
        }
    }

    /// Removes and returns every connection with a missing endpoint.
    pub fn prune_dangling(&mut self) -> Vec<Connection> {
        let (kept, dangling): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.connections)
                .into_iter()
                .partition(|connection| {
                    self.shapes.iter().any(|shape| shape.id == connection.from_id)
                        && self.shapes.iter().any(|shape| shape.id == connection.to_id)
                });
        self.connections = kept;

        for connection in &dangling {
            warn!(
                connection_id = connection.id.as_str(),
                from = connection.from_id.as_str(),
                to = connection.to_id.as_str();
                "Dropping connection with a missing endpoint"
            );
        }
        if let Selection::Connection(id) = &self.selection {
            if self.connection(id).is_none() {
                self.selection = Selection::None;
            }
        }
        dangling
    }
}
