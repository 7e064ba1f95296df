// gwctl-api: RPC seam between the gateway controller core and the bus glue.

pub mod arg;
pub mod error;
pub mod method;
pub mod payload;
pub mod transport;

pub use arg::{Arg, Reply};
pub use error::Error;
pub use method::{Interface, Method, ServiceNames};
pub use payload::{AclInfoRecord, InstalledAppRecord, ObjectDescriptionRecord, RemotedAppRecord};
pub use transport::{
    BusTransport, MethodCall, ProxyObject, Session, SessionId, SessionPort,
    TransportConfig,
};
