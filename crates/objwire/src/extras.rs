//! # Extras Pipeline
//!
//! Which metadata goes into each outgoing message.
//!
//! ## Invariants
//!
//! - **Requests** carry the handler's bulk extras, then the extras the sending proxy
//!   inherited, then every `send_back` property as `custom_<name>`.
//! - **Responses** carry the bulk extras, then every `custom_` extra of the request
//!   they answer, then the responder's own `send_back` properties.
//! - **Local properties** (`send_back == false`) are never written to any message.

use dashmap::DashMap;
use objwire_proto::Extras;
use objwire_proto::custom_key;
use objwire_proto::is_custom;

/// A handler property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub value: String,
    /// Whether the property travels to the peer, which echoes it back.
    pub send_back: bool,
}

pub(crate) fn for_request(
    bulk: &Extras,
    inherited: &Extras,
    properties: &DashMap<String, Property>,
) -> Extras {
    let mut extras = bulk.clone();
    extras.extend(inherited.iter().map(|(k, v)| (k.clone(), v.clone())));
    add_properties(&mut extras, properties);
    extras
}

pub(crate) fn for_response(
    bulk: &Extras,
    request: &Extras,
    properties: &DashMap<String, Property>,
) -> Extras {
    let mut extras = bulk.clone();
    extras.extend(echoed(request));
    add_properties(&mut extras, properties);
    extras
}

/// The `custom_` subset of `extras`: what gets echoed and what proxies inherit.
pub(crate) fn echoed(extras: &Extras) -> Extras {
    extras
        .iter()
        .filter(|(key, _)| is_custom(key))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn add_properties(extras: &mut Extras, properties: &DashMap<String, Property>) {
    for entry in properties.iter() {
        if entry.send_back {
            extras.insert(custom_key(entry.key()), entry.value.clone());
        }
    }
}
