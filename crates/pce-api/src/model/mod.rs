//! Typed PCE objects.
//!
//! Every model keeps the fields it does not name in a flattened `extra`
//! map, so decoding and re-encoding a server response loses nothing.
//! Unset `Option` fields are never serialized, which is what makes partial
//! updates work.

pub(crate) mod common;
mod access;
mod containers;
mod enums;
mod events;
mod ip_lists;
mod labels;
mod pairing;
mod policy;
mod rules;
mod services;
mod traffic;
mod virtual_services;
mod workloads;

pub use access::{SecurityPrincipal, User};
pub use common::{ApiObject, GenericObject, ObjectMeta, ObjectRef, PolicyObject};
pub use containers::{ContainerCluster, ContainerWorkloadProfile, ProfileLabel};
pub use enums::{
    ApplyTo, ChangeType, EnforcementMode, EventSeverity, EventStatus, FlowDirection, JobStatus,
    LinkState, Mode, PolicyDecision, TrafficState, Transmission, VisibilityLevel,
};
pub use events::Event;
pub use ip_lists::{ANY_IP_LIST_NAME, Fqdn, IpList, IpRange};
pub use labels::{Label, LabelGroup, LabelUsage, Scope, ScopeLabel};
pub use pairing::{PairingKey, PairingProfile};
pub(crate) use policy::ProvisionRequest;
pub use policy::{FirewallSettings, PolicyChangeset, PolicyObjectCounts, PolicyVersion};
pub use rules::{
    ALL_MANAGED_WORKLOADS, Actor, EnforcementBoundary, IngressService, LabelResolution, Rule,
    RuleSet,
};
pub use services::{
    PROTO_ICMP, PROTO_ICMPV6, PROTO_TCP, PROTO_UDP, Service, ServiceAddress, ServicePort,
    protocol_number,
};
pub use traffic::{
    DEFAULT_TRAFFIC_MAX_RESULTS, QueryOp, ServiceFilterBlock, TimestampRange, TrafficFilter,
    TrafficFilterBlock, TrafficFlow, TrafficNode, TrafficQuery,
};
pub use virtual_services::{PortOverride, ServiceBinding, VirtualService};
pub use workloads::{Interface, Ven, Workload};
