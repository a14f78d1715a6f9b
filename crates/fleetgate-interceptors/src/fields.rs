use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

trait ErasedField: Send + Sync {
    fn device_id<'a>(&self, message: &'a dyn Any) -> Option<&'a str>;
    fn rejected(&self) -> Box<dyn Any + Send>;
    fn encoded_rejection(&self) -> Vec<u8>;
}

struct TypedField<Req, Rsp> {
    extract: fn(&Req) -> &str,
    rejected: fn() -> Rsp,
    encode: fn(&Rsp) -> Vec<u8>,
}

fn encode_json<Rsp: Serialize>(response: &Rsp) -> Vec<u8> {
    serde_json::to_vec(response).unwrap_or_default()
}

impl<Req: Any, Rsp: Any + Send> ErasedField for TypedField<Req, Rsp> {
    fn device_id<'a>(&self, message: &'a dyn Any) -> Option<&'a str> {
        message.downcast_ref::<Req>().map(self.extract)
    }

    fn rejected(&self) -> Box<dyn Any + Send> {
        Box::new((self.rejected)())
    }

    fn encoded_rejection(&self) -> Vec<u8> {
        (self.encode)(&(self.rejected)())
    }
}

/// How to find the device id inside one request type, and what to answer
/// when it is malformed.
pub struct DeviceIdField {
    rpc: &'static str,
    field: Box<dyn ErasedField>,
}

impl DeviceIdField {
    pub fn rpc(&self) -> &'static str {
        self.rpc
    }

    pub fn device_id<'a>(&self, message: &'a dyn Any) -> Option<&'a str> {
        self.field.device_id(message)
    }

    /// A fresh rejection value of the RPC's response type.
    pub fn rejected_response(&self) -> Box<dyn Any + Send> {
        self.field.rejected()
    }

    /// The rejection value in its wire encoding, for transports that can
    /// only attach bytes to an error status.
    pub fn rejection_details(&self) -> Vec<u8> {
        self.field.encoded_rejection()
    }
}

impl fmt::Debug for DeviceIdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceIdField").field("rpc", &self.rpc).finish()
    }
}

/// Request types whose payload carries a device id, keyed by concrete type.
///
/// Messages of any other type are not looked at.
#[derive(Default)]
pub struct DeviceIdRegistry {
    fields: HashMap<TypeId, DeviceIdField>,
}

impl DeviceIdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `Req`, with the rejection value JSON-encoded on the wire.
    /// A later registration of the same type replaces the earlier one.
    pub fn register<Req, Rsp>(
        self,
        rpc: &'static str,
        extract: fn(&Req) -> &str,
        rejected: fn() -> Rsp,
    ) -> Self
    where
        Req: Any,
        Rsp: Any + Send + Serialize,
    {
        self.register_encoded(rpc, extract, rejected, encode_json::<Rsp>)
    }

    /// Like [`register`](Self::register) for response types that are not
    /// serde types, e.g. `|rsp: &Ack| rsp.encode_to_vec()` for prost messages.
    pub fn register_encoded<Req, Rsp>(
        mut self,
        rpc: &'static str,
        extract: fn(&Req) -> &str,
        rejected: fn() -> Rsp,
        encode: fn(&Rsp) -> Vec<u8>,
    ) -> Self
    where
        Req: Any,
        Rsp: Any + Send,
    {
        self.fields.insert(
            TypeId::of::<Req>(),
            DeviceIdField {
                rpc,
                field: Box::new(TypedField {
                    extract,
                    rejected,
                    encode,
                }),
            },
        );
        self
    }

    /// The entry for `message`'s type together with the id it carries.
    pub fn lookup<'a>(
        &'a self,
        message: &'a (dyn Any + Send),
    ) -> Option<(&'a DeviceIdField, &'a str)> {
        let message: &dyn Any = message;
        let field = self.fields.get(&message.type_id())?;
        let device_id = field.device_id(message)?;
        Some((field, device_id))
    }

    pub fn contains<Req: Any>(&self) -> bool {
        self.fields.contains_key(&TypeId::of::<Req>())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn rpcs(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.values().map(DeviceIdField::rpc)
    }
}

impl fmt::Debug for DeviceIdRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.rpcs()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping {
        device_id: String,
    }

    #[derive(Debug, PartialEq, serde::Serialize)]
    struct Pong {
        ok: bool,
    }

    struct Beacon {
        device_id: String,
    }

    #[derive(Debug, PartialEq)]
    struct BeaconAck(u8);

    fn registry() -> DeviceIdRegistry {
        DeviceIdRegistry::new().register(
            "/test.v1.Svc/Ping",
            |req: &Ping| req.device_id.as_str(),
            || Pong { ok: false },
        )
    }

    #[test]
    fn finds_registered_field() {
        let registry = registry();
        let ping = Ping {
            device_id: "edge-007".into(),
        };
        let (field, id) = registry.lookup(&ping).expect("registered");
        assert_eq!(id, "edge-007");
        assert_eq!(field.rpc(), "/test.v1.Svc/Ping");
        let rejected = field.rejected_response().downcast::<Pong>().expect("pong");
        assert_eq!(*rejected, Pong { ok: false });
    }

    #[test]
    fn rejection_details_use_the_registered_encoding() {
        let registry = registry().register_encoded(
            "/test.v1.Svc/Beacon",
            |req: &Beacon| req.device_id.as_str(),
            || BeaconAck(0),
            |ack: &BeaconAck| vec![0x08, ack.0],
        );

        let ping_req = Ping {
            device_id: "edge-007".into(),
        };
        let (ping, _) = registry.lookup(&ping_req).expect("ping");
        assert_eq!(ping.rejection_details(), br#"{"ok":false}"#.to_vec());

        let beacon_req = Beacon {
            device_id: "edge-007".into(),
        };
        let (beacon, _) = registry.lookup(&beacon_req).expect("beacon");
        assert_eq!(beacon.rejection_details(), vec![0x08, 0]);
        let ack = beacon.rejected_response().downcast::<BeaconAck>().expect("ack");
        assert_eq!(*ack, BeaconAck(0));
    }

    #[test]
    fn ignores_unregistered_types() {
        let registry = registry();
        assert!(registry.contains::<Ping>());
        assert!(!registry.contains::<Pong>());
        assert!(registry.lookup(&Pong { ok: true }).is_none());
        assert!(registry.lookup(&String::from("edge-007")).is_none());
    }
}
