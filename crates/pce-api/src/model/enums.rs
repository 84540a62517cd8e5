//! Closed value sets used across PCE objects.
//!
//! Every enum decodes by exact string match; a value outside the set fails
//! decoding instead of passing through.

use serde::{Deserialize, Serialize};

macro_rules! pce_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            Serialize,
            Deserialize,
            strum::Display,
            strum::EnumString,
            strum::EnumIter,
            strum::AsRefStr,
        )]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                #[strum(serialize = $wire)]
                $variant,
            )+
        }
    };
}

pce_enum! {
    /// Workload enforcement mode.
    pub enum EnforcementMode {
        Idle => "idle",
        VisibilityOnly => "visibility_only",
        Full => "full",
        Selective => "selective",
    }
}

pce_enum! {
    /// How much flow data a VEN reports.
    pub enum VisibilityLevel {
        FlowFullDetail => "flow_full_detail",
        FlowSummary => "flow_summary",
        FlowDrops => "flow_drops",
        FlowOff => "flow_off",
        EnhancedDataCollection => "enhanced_data_collection",
    }
}

pce_enum! {
    /// Legacy workload mode, superseded by `EnforcementMode`.
    pub enum Mode {
        Idle => "idle",
        Illuminated => "illuminated",
        Enforced => "enforced",
    }
}

pce_enum! {
    pub enum LinkState {
        Up => "up",
        Down => "down",
        Unknown => "unknown",
    }
}

pce_enum! {
    /// Where a virtual service's policy is applied.
    pub enum ApplyTo {
        HostOnly => "host_only",
        InternalBridgeNetwork => "internal_bridge_network",
    }
}

pce_enum! {
    pub enum PolicyDecision {
        Allowed => "allowed",
        Blocked => "blocked",
        PotentiallyBlocked => "potentially_blocked",
        Unknown => "unknown",
    }
}

pce_enum! {
    pub enum FlowDirection {
        Inbound => "inbound",
        Outbound => "outbound",
    }
}

pce_enum! {
    pub enum TrafficState {
        Active => "active",
        Closed => "closed",
        TimedOut => "timed out",
        Snapshot => "snapshot",
        New => "new",
        Unknown => "unknown",
        Incomplete => "incomplete",
    }
}

pce_enum! {
    pub enum Transmission {
        Broadcast => "broadcast",
        Multicast => "multicast",
        Unicast => "unicast",
    }
}

pce_enum! {
    /// Syslog-style event severity.
    pub enum EventSeverity {
        Emergency => "emerg",
        Alert => "alert",
        Critical => "crit",
        Error => "err",
        Warning => "warning",
        Notice => "notice",
        Info => "info",
        Debug => "debug",
    }
}

pce_enum! {
    pub enum EventStatus {
        Success => "success",
        Failure => "failure",
    }
}

pce_enum! {
    /// Kind of change recorded in a resource event.
    pub enum ChangeType {
        Create => "create",
        Update => "update",
        Delete => "delete",
    }
}

pce_enum! {
    /// Status reported by an async job.
    pub enum JobStatus {
        Pending => "pending",
        Queued => "queued",
        Running => "running",
        Working => "working",
        /// Collection jobs finish as `done`.
        Done => "done",
        /// Traffic queries finish as `completed`.
        Completed => "completed",
        Failed => "failed",
        Killed => "killed",
    }
}

impl JobStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Done | Self::Completed)
    }

    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed | Self::Killed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn decodes_exact_wire_values() {
        let state: TrafficState = serde_json::from_str("\"timed out\"").unwrap();
        assert_eq!(state, TrafficState::TimedOut);
        let mode: EnforcementMode = serde_json::from_str("\"visibility_only\"").unwrap();
        assert_eq!(mode, EnforcementMode::VisibilityOnly);
    }

    #[test]
    fn unknown_values_fail_decoding() {
        assert!(serde_json::from_str::<EnforcementMode>("\"strict\"").is_err());
        assert!(serde_json::from_str::<LinkState>("\"UP\"").is_err());
    }

    #[test]
    fn display_matches_wire_value() {
        assert_eq!(VisibilityLevel::FlowDrops.to_string(), "flow_drops");
        assert_eq!("crit".parse::<EventSeverity>().unwrap(), EventSeverity::Critical);
    }
}
