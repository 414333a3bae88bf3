mod connection;

pub use connection::{
    ABNORMAL_CLOSURE, ChatConnection, InboundEvents, NORMAL_CLOSURE, NO_STATUS, Transport,
    TransportEvent,
};
