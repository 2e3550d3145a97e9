use crate::proto::interchainquery::v1::Query;

pub const MODULE_NAME: &str = "interchainquery";

pub const EVENT_TYPE_MESSAGE: &str = "message";

pub const ATTRIBUTE_KEY_MODULE: &str = "module";
pub const ATTRIBUTE_KEY_QUERY_ID: &str = "query_id";
pub const ATTRIBUTE_KEY_CHAIN_ID: &str = "chain_id";
pub const ATTRIBUTE_KEY_CONNECTION_ID: &str = "connection_id";
pub const ATTRIBUTE_KEY_TYPE: &str = "type";
pub const ATTRIBUTE_KEY_REQUEST: &str = "request";
pub const ATTRIBUTE_KEY_HEIGHT: &str = "height";

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

/// A chain event. The block-cycle emitter hands these to the host, which
/// publishes them through its event stream; the relayer consumes them as
/// positionally-aligned attribute arrays keyed `<kind>.<attribute>`.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<Attribute>,
}

impl Event {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            attributes: vec![],
        }
    }

    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.push(Attribute {
            key: key.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// The per-query event emitted by the block-cycle emitter. The height
/// attribute is always "0": the relayer pins the execution height itself.
pub fn query_event(query: &Query) -> Event {
    Event::new(EVENT_TYPE_MESSAGE)
        .attribute(ATTRIBUTE_KEY_MODULE, MODULE_NAME)
        .attribute(ATTRIBUTE_KEY_QUERY_ID, &query.id)
        .attribute(ATTRIBUTE_KEY_CHAIN_ID, &query.chain_id)
        .attribute(ATTRIBUTE_KEY_CONNECTION_ID, &query.connection_id)
        .attribute(ATTRIBUTE_KEY_TYPE, &query.query_type)
        .attribute(ATTRIBUTE_KEY_REQUEST, &hex::encode(&query.request))
        .attribute(ATTRIBUTE_KEY_HEIGHT, "0")
}

/// Generic "message processed" event emitted after an accepted response.
pub fn message_processed_event() -> Event {
    Event::new(EVENT_TYPE_MESSAGE).attribute(ATTRIBUTE_KEY_MODULE, MODULE_NAME)
}
