//! Abstract syntax tree for a parsed specification document.
//!
//! The tree mirrors the JSON wire format described by the external schema:
//! a top-level [`Spec`] owning ordered collections of declarations, an
//! expression language nested inside a clause language nested inside
//! [`Rule`]/[`Surface`] declarations.
//!
//! Discriminated unions (`FieldType`, `Trigger`, `EnsuresClause`,
//! `Expression`, `ProvidesClause`) are modelled as internally tagged enums
//! keyed on a `kind` field, matching the source document's discriminator
//! strings exactly.

use indexmap::IndexMap;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The top-level parsed document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spec {
    pub version: String,
    pub file: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub use_declarations: Vec<UseDeclaration>,
    #[serde(default)]
    pub given: Vec<GivenBinding>,
    #[serde(default)]
    pub external_entities: Vec<ExternalEntity>,
    #[serde(default)]
    pub value_types: Vec<ValueType>,
    #[serde(default)]
    pub enumerations: Vec<Enumeration>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub config: Vec<ConfigParam>,
    #[serde(default)]
    pub defaults: Vec<DefaultInstance>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub surfaces: Vec<Surface>,
    #[serde(default)]
    pub deferred: Vec<Deferred>,
    #[serde(default)]
    pub open_questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UseDeclaration {
    pub coordinate: String,
    pub alias: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GivenBinding {
    pub name: String,
    #[serde(rename = "type")]
    pub binding_type: FieldType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalEntity {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueType {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub derived_values: Vec<DerivedValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enumeration {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// `name ∈ {String, Integer, Boolean, Timestamp, Duration}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    String,
    Integer,
    Boolean,
    Timestamp,
    Duration,
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimitiveKind::String => write!(f, "String"),
            PrimitiveKind::Integer => write!(f, "Integer"),
            PrimitiveKind::Boolean => write!(f, "Boolean"),
            PrimitiveKind::Timestamp => write!(f, "Timestamp"),
            PrimitiveKind::Duration => write!(f, "Duration"),
        }
    }
}

/// Exhaustive tagged union of field types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    Primitive { name: PrimitiveKind },
    EntityRef { entity_name: String },
    InlineEnum { values: Vec<String> },
    NamedEnum { name: String },
    Optional { inner: Box<FieldType> },
    Set { element: Box<FieldType> },
    List { element: Box<FieldType> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub name: String,
    pub target_entity: String,
    pub foreign_key: String,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    pub name: String,
    pub source: String,
    pub condition: Expression,
    #[serde(default)]
    pub mapping: Option<IndexMap<String, Expression>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedValue {
    pub name: String,
    #[serde(default)]
    pub parameters: Option<Vec<Parameter>>,
    pub expression: Expression,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub projections: Vec<Projection>,
    #[serde(default)]
    pub derived_values: Vec<DerivedValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub base_entity: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigParam {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: FieldType,
    pub default: Expression,
}

/// A named seed instance of an entity. Named `DefaultInstance` to avoid
/// colliding with [`std::default::Default`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultInstance {
    pub name: String,
    pub entity: String,
    #[serde(default)]
    pub fields: IndexMap<String, Expression>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifiedBy {
    pub entity: String,
    pub condition: Expression,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub identified_by: IdentifiedBy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deferred {
    pub name: String,
    #[serde(default)]
    pub location_hint: Option<String>,
}

/// Seven-variant tagged union describing what causes a rule to fire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    ExternalStimulus {
        name: String,
        #[serde(default)]
        parameters: Vec<Parameter>,
    },
    StateTransition {
        entity: String,
        field: String,
        binding: String,
        to_value: String,
    },
    StateBecomes {
        entity: String,
        field: String,
        binding: String,
        value: String,
    },
    Temporal {
        entity: String,
        binding: String,
        #[serde(default)]
        field: Option<String>,
        #[serde(default)]
        condition: Option<Expression>,
    },
    DerivedCondition {
        entity: String,
        field: String,
        binding: String,
    },
    EntityCreation {
        entity: String,
        binding: String,
    },
    Chained {
        name: String,
        #[serde(default)]
        parameters: Vec<Parameter>,
    },
}

impl Trigger {
    /// The trigger kind's name used for global lookup (`external_stimulus`
    /// and `chained` only carry a globally-shared name).
    pub fn shared_name(&self) -> Option<&str> {
        match self {
            Trigger::ExternalStimulus { name, .. } | Trigger::Chained { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The entity this trigger is anchored to, when it names one directly.
    pub fn entity(&self) -> Option<&str> {
        match self {
            Trigger::StateTransition { entity, .. }
            | Trigger::StateBecomes { entity, .. }
            | Trigger::Temporal { entity, .. }
            | Trigger::DerivedCondition { entity, .. }
            | Trigger::EntityCreation { entity, .. } => Some(entity),
            Trigger::ExternalStimulus { .. } | Trigger::Chained { .. } => None,
        }
    }

    /// The binding name this trigger introduces into rule scope, if any.
    pub fn binding(&self) -> Option<&str> {
        match self {
            Trigger::StateTransition { binding, .. }
            | Trigger::StateBecomes { binding, .. }
            | Trigger::Temporal { binding, .. }
            | Trigger::DerivedCondition { binding, .. }
            | Trigger::EntityCreation { binding, .. } => Some(binding),
            Trigger::ExternalStimulus { .. } | Trigger::Chained { .. } => None,
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        match self {
            Trigger::ExternalStimulus { parameters, .. } | Trigger::Chained { parameters, .. } => {
                parameters
            }
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForClause {
    pub binding: String,
    pub collection: Expression,
    #[serde(default)]
    pub condition: Option<Expression>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetBinding {
    pub name: String,
    pub expression: Expression,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub trigger: Trigger,
    #[serde(default)]
    pub for_clause: Option<ForClause>,
    #[serde(default)]
    pub let_bindings: Vec<LetBinding>,
    #[serde(default)]
    pub requires: Vec<Expression>,
    pub ensures: Vec<EnsuresClause>,
}

/// Payload shared by `EnsuresClause::EntityCreation` and, via [`Value`], by
/// `let_binding.value` when it names a nested creation rather than an
/// expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCreationClause {
    pub entity: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: IndexMap<String, Expression>,
}

/// `state_change.value` and `let_binding.value` accept either an
/// [`Expression`] or a nested [`EntityCreationClause`]; the JSON layer
/// distinguishes the two by probing for `"kind": "entity_creation"` before
/// falling back to expression.
#[derive(Debug, Clone)]
pub enum Value {
    Expression(Expression),
    EntityCreation(EntityCreationClause),
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let is_entity_creation = raw.get("kind").and_then(|k| k.as_str()) == Some("entity_creation");
        if is_entity_creation {
            EntityCreationClause::deserialize(raw)
                .map(Value::EntityCreation)
                .map_err(DeError::custom)
        } else {
            Expression::deserialize(raw)
                .map(Value::Expression)
                .map_err(DeError::custom)
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Expression(expr) => expr.serialize(serializer),
            Value::EntityCreation(clause) => {
                #[derive(Serialize)]
                struct Tagged<'a> {
                    kind: &'static str,
                    #[serde(flatten)]
                    inner: &'a EntityCreationClause,
                }
                Tagged {
                    kind: "entity_creation",
                    inner: clause,
                }
                .serialize(serializer)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOp {
    Add,
    Remove,
}

/// Eight-variant tagged union of post-condition actions emitted by a rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnsuresClause {
    StateChange {
        target: Expression,
        value: Value,
    },
    EntityCreation(EntityCreationClause),
    TriggerEmission {
        name: String,
        #[serde(default)]
        arguments: IndexMap<String, Expression>,
    },
    EntityRemoval {
        target: Expression,
    },
    Conditional {
        condition: Expression,
        #[serde(rename = "then", default)]
        then_branch: Vec<EnsuresClause>,
        #[serde(rename = "else", default)]
        else_branch: Vec<EnsuresClause>,
    },
    Iteration {
        binding: String,
        collection: Expression,
        body: Vec<EnsuresClause>,
    },
    LetBinding {
        binding: String,
        value: Value,
        body: Vec<EnsuresClause>,
    },
    SetMutation {
        target: Expression,
        operation: SetOp,
        value: Expression,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralType {
    Integer,
    String,
    Boolean,
    Timestamp,
    Duration,
    EnumValue,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOp {
    And,
    Or,
}

/// Tagged union of the expression language. `collection_op.operation` is
/// kept as an open string set (`any`, `all`, `count`, `filter`, `map`,
/// `sum`, `min`, `max`, ... — the source lists it with a trailing ellipsis),
/// matched on by string literal in the passes that care.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    Literal {
        #[serde(rename = "type")]
        literal_type: LiteralType,
        value: serde_json::Value,
    },
    FieldAccess {
        #[serde(default)]
        object: Option<Box<Expression>>,
        field: String,
    },
    Comparison {
        op: ComparisonOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    BooleanLogic {
        op: BooleanOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Not {
        operand: Box<Expression>,
    },
    NullCoalesce {
        left: Box<Expression>,
        right: Box<Expression>,
    },
    FunctionCall {
        name: String,
        #[serde(default)]
        arguments: Vec<Expression>,
    },
    CollectionOp {
        operation: String,
        collection: Box<Expression>,
        #[serde(default)]
        lambda: Option<Box<Expression>>,
        #[serde(default)]
        condition: Option<Box<Expression>>,
    },
    Lambda {
        parameter: String,
        body: Box<Expression>,
    },
    Exists {
        target: Box<Expression>,
    },
    SetLiteral {
        #[serde(default)]
        elements: Vec<Expression>,
    },
    Membership {
        element: Box<Expression>,
        collection: Box<Expression>,
    },
    JoinLookup {
        entity: String,
        #[serde(default)]
        fields: IndexMap<String, Expression>,
    },
}

impl Expression {
    /// `true` for a root identifier reference (`object == null`).
    pub fn is_root_field_access(&self) -> bool {
        matches!(self, Expression::FieldAccess { object: None, .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacingBinding {
    pub binding: String,
    #[serde(rename = "type")]
    pub facing_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextBinding {
    pub binding: String,
    #[serde(rename = "type")]
    pub context_type: String,
    #[serde(default)]
    pub condition: Option<Expression>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposesClause {
    pub expression: Expression,
    #[serde(default)]
    pub when: Option<Expression>,
}

/// `provides` entries: either a direct trigger-invoking action or a
/// `for_each` fan-out over a collection-typed target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProvidesClause {
    Action {
        trigger: String,
        #[serde(default)]
        arguments: IndexMap<String, Expression>,
        #[serde(default)]
        when: Option<Expression>,
    },
    ForEach {
        binding: String,
        collection: Expression,
        #[serde(default)]
        items: Vec<ProvidesClause>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedClause {
    pub surface: String,
    pub context_expression: Expression,
    #[serde(default)]
    pub when: Option<Expression>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutClause {
    pub rule: String,
    #[serde(default)]
    pub when: Option<Expression>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surface {
    pub name: String,
    pub facing: FacingBinding,
    #[serde(default)]
    pub context: Option<ContextBinding>,
    #[serde(default)]
    pub let_bindings: Vec<LetBinding>,
    #[serde(default)]
    pub exposes: Vec<ExposesClause>,
    #[serde(default)]
    pub provides: Vec<ProvidesClause>,
    #[serde(default)]
    pub guarantees: Vec<Expression>,
    #[serde(default)]
    pub related: Vec<RelatedClause>,
    #[serde(default)]
    pub timeout: Vec<TimeoutClause>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_round_trips_primitive() {
        let ft = FieldType::Primitive {
            name: PrimitiveKind::String,
        };
        let json = serde_json::to_value(&ft).unwrap();
        assert_eq!(json["kind"], "primitive");
        assert_eq!(json["name"], "String");
        let back: FieldType = serde_json::from_value(json).unwrap();
        assert!(matches!(
            back,
            FieldType::Primitive {
                name: PrimitiveKind::String
            }
        ));
    }

    #[test]
    fn comparison_op_uses_symbolic_rename() {
        let expr = Expression::Comparison {
            op: ComparisonOp::Ne,
            left: Box::new(Expression::FieldAccess {
                object: None,
                field: "status".into(),
            }),
            right: Box::new(Expression::Literal {
                literal_type: LiteralType::String,
                value: serde_json::json!("done"),
            }),
        };
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(json["op"], "!=");
    }

    #[test]
    fn value_prefers_entity_creation_when_kind_matches() {
        let raw = serde_json::json!({
            "kind": "entity_creation",
            "entity": "Order",
            "fields": {}
        });
        let value: Value = serde_json::from_value(raw).unwrap();
        assert!(matches!(value, Value::EntityCreation(_)));
    }

    #[test]
    fn value_falls_back_to_expression() {
        let raw = serde_json::json!({
            "kind": "field_access",
            "field": "total"
        });
        let value: Value = serde_json::from_value(raw).unwrap();
        assert!(matches!(value, Value::Expression(_)));
    }

    #[test]
    fn ensures_clause_entity_creation_is_newtype_variant() {
        let raw = serde_json::json!({
            "kind": "entity_creation",
            "entity": "Order",
            "fields": {"status": {"kind": "literal", "type": "string", "value": "pending"}}
        });
        let clause: EnsuresClause = serde_json::from_value(raw).unwrap();
        match clause {
            EnsuresClause::EntityCreation(c) => assert_eq!(c.entity, "Order"),
            other => panic!("expected entity_creation, got {other:?}"),
        }
    }

    #[test]
    fn root_field_access_detection() {
        let root = Expression::FieldAccess {
            object: None,
            field: "status".into(),
        };
        assert!(root.is_root_field_access());
        let chained = Expression::FieldAccess {
            object: Some(Box::new(root.clone())),
            field: "nested".into(),
        };
        assert!(!chained.is_root_field_access());
    }
}
