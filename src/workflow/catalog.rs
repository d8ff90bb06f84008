/// Node catalog for trading automation workflows
///
/// Every node carries a typed configuration payload keyed by its kind. The payload
/// is validated when a node is configured or imported so malformed documents are
/// caught before they reach the workflow service. Kinds outside this catalog are
/// carried through untouched.

use crate::error::ValidationError;
use chrono::NaiveTime;
use serde::{
    de::Error as _,
    ser::SerializeStruct,
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::{Map, Value};
use std::fmt;
use validator::Validate;

/// Kind tag of a node, matching the `type` field on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Start,
    TimeTrigger,
    PriceAlert,
    PriceCondition,
    TimeWindow,
    PlaceOrder,
    CancelAllOrders,
    ClosePositions,
    Delay,
    Notify,
}

/// Palette grouping used by the editor sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    Trigger,
    Condition,
    Action,
    Utility,
}

impl NodeKind {
    pub const ALL: [NodeKind; 10] = [
        NodeKind::Start,
        NodeKind::TimeTrigger,
        NodeKind::PriceAlert,
        NodeKind::PriceCondition,
        NodeKind::TimeWindow,
        NodeKind::PlaceOrder,
        NodeKind::CancelAllOrders,
        NodeKind::ClosePositions,
        NodeKind::Delay,
        NodeKind::Notify,
    ];

    /// Kind with the given wire tag, if the catalog knows it
    pub fn parse(tag: &str) -> Option<NodeKind> {
        NodeKind::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::TimeTrigger => "time_trigger",
            NodeKind::PriceAlert => "price_alert",
            NodeKind::PriceCondition => "price_condition",
            NodeKind::TimeWindow => "time_window",
            NodeKind::PlaceOrder => "place_order",
            NodeKind::CancelAllOrders => "cancel_all_orders",
            NodeKind::ClosePositions => "close_positions",
            NodeKind::Delay => "delay",
            NodeKind::Notify => "notify",
        }
    }

    pub fn category(&self) -> NodeCategory {
        match self {
            NodeKind::Start | NodeKind::TimeTrigger | NodeKind::PriceAlert => NodeCategory::Trigger,
            NodeKind::PriceCondition | NodeKind::TimeWindow => NodeCategory::Condition,
            NodeKind::PlaceOrder | NodeKind::CancelAllOrders | NodeKind::ClosePositions => {
                NodeCategory::Action
            }
            NodeKind::Delay | NodeKind::Notify => NodeCategory::Utility,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed configuration payload of a node
///
/// Serialized adjacently tagged as `{"type": <kind>, "data": {...}}`. A tag the
/// catalog does not know becomes [`NodeConfig::Unknown`] and round-trips verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeConfig {
    Start(StartConfig),
    TimeTrigger(TimeTriggerConfig),
    PriceAlert(PriceAlertConfig),
    PriceCondition(PriceConditionConfig),
    TimeWindow(TimeWindowConfig),
    PlaceOrder(PlaceOrderConfig),
    CancelAllOrders(CancelAllOrdersConfig),
    ClosePositions(ClosePositionsConfig),
    Delay(DelayConfig),
    Notify(NotifyConfig),
    /// Node type served by the workflow service but absent from this catalog
    Unknown { kind: String, data: Value },
}

impl NodeConfig {
    /// Default payload a freshly added node of this kind starts with
    pub fn defaults(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Start => NodeConfig::Start(StartConfig::default()),
            NodeKind::TimeTrigger => NodeConfig::TimeTrigger(TimeTriggerConfig::default()),
            NodeKind::PriceAlert => NodeConfig::PriceAlert(PriceAlertConfig::default()),
            NodeKind::PriceCondition => NodeConfig::PriceCondition(PriceConditionConfig::default()),
            NodeKind::TimeWindow => NodeConfig::TimeWindow(TimeWindowConfig::default()),
            NodeKind::PlaceOrder => NodeConfig::PlaceOrder(PlaceOrderConfig::default()),
            NodeKind::CancelAllOrders => NodeConfig::CancelAllOrders(CancelAllOrdersConfig::default()),
            NodeKind::ClosePositions => NodeConfig::ClosePositions(ClosePositionsConfig::default()),
            NodeKind::Delay => NodeConfig::Delay(DelayConfig::default()),
            NodeKind::Notify => NodeConfig::Notify(NotifyConfig::default()),
        }
    }

    /// Catalog kind of the payload; `None` for pass-through nodes
    pub fn kind(&self) -> Option<NodeKind> {
        Some(match self {
            NodeConfig::Start(_) => NodeKind::Start,
            NodeConfig::TimeTrigger(_) => NodeKind::TimeTrigger,
            NodeConfig::PriceAlert(_) => NodeKind::PriceAlert,
            NodeConfig::PriceCondition(_) => NodeKind::PriceCondition,
            NodeConfig::TimeWindow(_) => NodeKind::TimeWindow,
            NodeConfig::PlaceOrder(_) => NodeKind::PlaceOrder,
            NodeConfig::CancelAllOrders(_) => NodeKind::CancelAllOrders,
            NodeConfig::ClosePositions(_) => NodeKind::ClosePositions,
            NodeConfig::Delay(_) => NodeKind::Delay,
            NodeConfig::Notify(_) => NodeKind::Notify,
            NodeConfig::Unknown { .. } => return None,
        })
    }

    /// The `type` tag as it appears on the wire
    pub fn type_name(&self) -> &str {
        match self {
            NodeConfig::Unknown { kind, .. } => kind,
            known => known.kind().map(|kind| kind.as_str()).unwrap_or_default(),
        }
    }

    /// Build a payload from its wire tag and `data` object
    ///
    /// Known tags must carry a payload matching their schema; unknown tags are kept
    /// as-is. A missing `data` reads as an empty object.
    pub fn from_parts(tag: String, data: Value) -> Result<Self, serde_json::Error> {
        let data = if data.is_null() {
            Value::Object(Map::new())
        } else {
            data
        };
        let Some(kind) = NodeKind::parse(&tag) else {
            return Ok(NodeConfig::Unknown { kind: tag, data });
        };

        Ok(match kind {
            NodeKind::Start => NodeConfig::Start(serde_json::from_value(data)?),
            NodeKind::TimeTrigger => NodeConfig::TimeTrigger(serde_json::from_value(data)?),
            NodeKind::PriceAlert => NodeConfig::PriceAlert(serde_json::from_value(data)?),
            NodeKind::PriceCondition => NodeConfig::PriceCondition(serde_json::from_value(data)?),
            NodeKind::TimeWindow => NodeConfig::TimeWindow(serde_json::from_value(data)?),
            NodeKind::PlaceOrder => NodeConfig::PlaceOrder(serde_json::from_value(data)?),
            NodeKind::CancelAllOrders => NodeConfig::CancelAllOrders(serde_json::from_value(data)?),
            NodeKind::ClosePositions => NodeConfig::ClosePositions(serde_json::from_value(data)?),
            NodeKind::Delay => NodeConfig::Delay(serde_json::from_value(data)?),
            NodeKind::Notify => NodeConfig::Notify(serde_json::from_value(data)?),
        })
    }

    /// Check the payload against its kind's schema
    ///
    /// `node_id` is only used to label the error.
    pub fn validate(&self, node_id: &str) -> Result<(), ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidNode {
            node_id: node_id.to_string(),
            reason,
        };

        let derived = match self {
            NodeConfig::Start(config) => config.validate(),
            NodeConfig::TimeTrigger(config) => {
                parse_clock(&config.time).map_err(invalid)?;
                Ok(())
            }
            NodeConfig::PriceAlert(config) => config.validate(),
            NodeConfig::PriceCondition(config) => config.validate(),
            NodeConfig::TimeWindow(config) => {
                let start = parse_clock(&config.start).map_err(invalid)?;
                let end = parse_clock(&config.end).map_err(invalid)?;
                if end <= start {
                    return Err(invalid(format!(
                        "window end {} must be after start {}",
                        config.end, config.start
                    )));
                }
                Ok(())
            }
            NodeConfig::PlaceOrder(config) => {
                config.validate().map_err(|e| invalid(e.to_string()))?;
                if config.price_type.needs_limit_price() && config.price <= 0.0 {
                    return Err(invalid(format!(
                        "{} orders need a positive price",
                        config.price_type.as_str()
                    )));
                }
                if config.price_type.needs_trigger_price() && config.trigger_price <= 0.0 {
                    return Err(invalid(format!(
                        "{} orders need a positive trigger price",
                        config.price_type.as_str()
                    )));
                }
                Ok(())
            }
            NodeConfig::CancelAllOrders(_) | NodeConfig::ClosePositions(_) => Ok(()),
            NodeConfig::Delay(config) => config.validate(),
            NodeConfig::Notify(config) => config.validate(),
            NodeConfig::Unknown { .. } => Ok(()),
        };

        derived.map_err(|e| invalid(e.to_string()))
    }
}

impl Serialize for NodeConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("NodeConfig", 2)?;
        state.serialize_field("type", self.type_name())?;
        match self {
            NodeConfig::Start(data) => state.serialize_field("data", data)?,
            NodeConfig::TimeTrigger(data) => state.serialize_field("data", data)?,
            NodeConfig::PriceAlert(data) => state.serialize_field("data", data)?,
            NodeConfig::PriceCondition(data) => state.serialize_field("data", data)?,
            NodeConfig::TimeWindow(data) => state.serialize_field("data", data)?,
            NodeConfig::PlaceOrder(data) => state.serialize_field("data", data)?,
            NodeConfig::CancelAllOrders(data) => state.serialize_field("data", data)?,
            NodeConfig::ClosePositions(data) => state.serialize_field("data", data)?,
            NodeConfig::Delay(data) => state.serialize_field("data", data)?,
            NodeConfig::Notify(data) => state.serialize_field("data", data)?,
            NodeConfig::Unknown { data, .. } => state.serialize_field("data", data)?,
        }
        state.end()
    }
}

/// Wire shape read before dispatching on the tag
#[derive(Deserialize)]
struct TaggedPayload {
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    data: Value,
}

impl<'de> Deserialize<'de> for NodeConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let TaggedPayload { tag, data } = TaggedPayload::deserialize(deserializer)?;
        NodeConfig::from_parts(tag, data).map_err(D::Error::custom)
    }
}

fn parse_clock(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| format!("'{value}' is not a HH:MM time"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    #[default]
    Nse,
    Bse,
    Nfo,
    Bfo,
    Mcx,
    Cds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    #[default]
    Above,
    Below,
    CrossesAbove,
    CrossesBelow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderAction {
    #[default]
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PriceType {
    #[default]
    #[serde(rename = "MARKET")]
    Market,
    #[serde(rename = "LIMIT")]
    Limit,
    #[serde(rename = "SL")]
    StopLoss,
    #[serde(rename = "SL-M")]
    StopLossMarket,
}

impl PriceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceType::Market => "MARKET",
            PriceType::Limit => "LIMIT",
            PriceType::StopLoss => "SL",
            PriceType::StopLossMarket => "SL-M",
        }
    }

    fn needs_limit_price(&self) -> bool {
        matches!(self, PriceType::Limit | PriceType::StopLoss)
    }

    fn needs_trigger_price(&self) -> bool {
        matches!(self, PriceType::StopLoss | PriceType::StopLossMarket)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Product {
    #[default]
    Mis,
    Cnc,
    Nrml,
}

/// Manual entry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StartConfig {
    #[validate(length(max = 100, message = "Label cannot exceed 100 characters"))]
    pub label: String,
}

impl Default for StartConfig {
    fn default() -> Self {
        Self { label: "Start".to_string() }
    }
}

/// Fires at a wall-clock time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeTriggerConfig {
    /// `HH:MM`, exchange local time
    pub time: String,
    pub weekdays_only: bool,
}

impl Default for TimeTriggerConfig {
    fn default() -> Self {
        Self {
            time: "09:15".to_string(),
            weekdays_only: true,
        }
    }
}

/// Fires when a symbol's price crosses a threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PriceAlertConfig {
    #[validate(length(min = 1, max = 50, message = "Symbol must be between 1 and 50 characters"))]
    pub symbol: String,
    pub exchange: Exchange,
    pub comparison: Comparison,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
}

impl Default for PriceAlertConfig {
    fn default() -> Self {
        Self {
            symbol: "SBIN".to_string(),
            exchange: Exchange::Nse,
            comparison: Comparison::Above,
            price: 0.0,
        }
    }
}

/// Branches on the current price of a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PriceConditionConfig {
    #[validate(length(min = 1, max = 50, message = "Symbol must be between 1 and 50 characters"))]
    pub symbol: String,
    pub exchange: Exchange,
    pub comparison: Comparison,
    #[validate(range(min = 0.0, message = "Value cannot be negative"))]
    pub value: f64,
}

impl Default for PriceConditionConfig {
    fn default() -> Self {
        Self {
            symbol: "SBIN".to_string(),
            exchange: Exchange::Nse,
            comparison: Comparison::Above,
            value: 0.0,
        }
    }
}

/// Passes only inside a time-of-day window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeWindowConfig {
    pub start: String,
    pub end: String,
}

impl Default for TimeWindowConfig {
    fn default() -> Self {
        Self {
            start: "09:15".to_string(),
            end: "15:30".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PlaceOrderConfig {
    #[validate(length(min = 1, max = 50, message = "Symbol must be between 1 and 50 characters"))]
    pub symbol: String,
    pub exchange: Exchange,
    pub action: OrderAction,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
    pub price_type: PriceType,
    pub product: Product,
    pub price: f64,
    pub trigger_price: f64,
}

impl Default for PlaceOrderConfig {
    fn default() -> Self {
        Self {
            symbol: "SBIN".to_string(),
            exchange: Exchange::Nse,
            action: OrderAction::Buy,
            quantity: 1,
            price_type: PriceType::Market,
            product: Product::Mis,
            price: 0.0,
            trigger_price: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CancelAllOrdersConfig {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosePositionsConfig {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DelayConfig {
    #[validate(range(min = 1, max = 86400, message = "Delay must be between 1 second and 1 day"))]
    pub seconds: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self { seconds: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NotifyConfig {
    #[validate(length(min = 1, max = 1000, message = "Message must be between 1 and 1000 characters"))]
    pub message: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            message: "Workflow step reached".to_string(),
        }
    }
}
