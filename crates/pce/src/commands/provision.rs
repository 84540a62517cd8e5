//! Policy-level commands: health, provision, pairing-key, traffic.

use chrono::{Duration, Utc};
use pce_api::model::{PolicyDecision, TrafficFilterBlock, TrafficFlow, TrafficNode, TrafficQuery};
use pce_api::{PceClient, PollOptions};
use tabled::Tabled;

use crate::cli::{GlobalOpts, OutputFormat, ProvisionArgs, TrafficArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn health(client: &PceClient, global: &GlobalOpts) -> Result<(), CliError> {
    let url = client.base_url().to_string();
    if !client.check_connection().await {
        return Err(CliError::UnexpectedResponse {
            message: format!("PCE at {url} did not report healthy"),
        });
    }
    if !global.quiet {
        let color = output::should_color(&global.color);
        println!("{}", output::success(&format!("{url} is reachable"), color));
    }
    Ok(())
}

pub async fn provision(
    client: &PceClient,
    args: ProvisionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let hrefs = args
        .hrefs
        .iter()
        .map(|raw| util::parse_href(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let version = client.provision_policy_changes(&args.message, &hrefs).await?;

    match global.output {
        OutputFormat::Table => {
            if !global.quiet {
                let color = output::should_color(&global.color);
                let label = version
                    .version
                    .map_or_else(|| "new policy version".to_owned(), |v| format!("policy version {v}"));
                let affected = version.workloads_affected.unwrap_or_default();
                println!(
                    "{}",
                    output::success(
                        &format!("Provisioned {label} ({affected} workloads affected)"),
                        color
                    )
                );
            }
        }
        ref format => {
            let out = output::render_single(format, &version, |v| {
                v.meta
                    .href
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
        }
    }
    Ok(())
}

pub async fn pairing_key(
    client: &PceClient,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let href = util::parse_href(profile)?;
    let key = client.generate_pairing_key(&href).await?;
    output::print_output(&key, global.quiet);
    Ok(())
}

// ── Traffic ─────────────────────────────────────────────────────────

#[derive(Tabled)]
struct FlowRow {
    #[tabled(rename = "Source")]
    src: String,
    #[tabled(rename = "Destination")]
    dst: String,
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Proto")]
    proto: String,
    #[tabled(rename = "Connections")]
    connections: u64,
    #[tabled(rename = "Decision")]
    decision: String,
}

fn node_name(node: &TrafficNode) -> String {
    let hostname = node
        .workload
        .as_ref()
        .and_then(|w| w.as_object())
        .and_then(|w| w.hostname.clone());
    hostname
        .or_else(|| node.ip.clone())
        .or_else(|| node.fqdn.clone())
        .or_else(|| node.workload.as_ref().and_then(|w| w.href()).map(ToString::to_string))
        .unwrap_or_default()
}

impl From<&TrafficFlow> for FlowRow {
    fn from(flow: &TrafficFlow) -> Self {
        let service = flow.service.as_ref();
        Self {
            src: node_name(&flow.src),
            dst: node_name(&flow.dst),
            port: service
                .and_then(|s| s.port)
                .map(|p| p.to_string())
                .unwrap_or_default(),
            proto: service
                .and_then(|s| s.proto)
                .map(|p| p.to_string())
                .unwrap_or_default(),
            connections: flow.num_connections.unwrap_or_default(),
            decision: flow
                .policy_decision
                .map(|d| d.to_string())
                .unwrap_or_default(),
        }
    }
}

fn strs(v: &[String]) -> Vec<&str> {
    v.iter().map(String::as_str).collect()
}

fn build_traffic_query(args: &TrafficArgs) -> Result<TrafficQuery, CliError> {
    let end = Utc::now();
    let start = end - Duration::days(i64::from(args.days));

    let sources = TrafficFilterBlock::from_strs(&strs(&args.sources), &strs(&args.exclude_sources))?;
    let destinations = TrafficFilterBlock::from_strs(
        &strs(&args.destinations),
        &strs(&args.exclude_destinations),
    )?;
    let decisions = args
        .decisions
        .iter()
        .map(|raw| {
            raw.parse::<PolicyDecision>()
                .map_err(|_| CliError::Validation {
                    field: "decision".into(),
                    reason: format!(
                        "unknown policy decision '{raw}' (allowed, blocked, potentially_blocked, unknown)"
                    ),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut query = TrafficQuery::new(start, end)?
        .with_sources(sources)
        .with_destinations(destinations)
        .with_policy_decisions(decisions);
    if let Some(max) = args.max_results {
        query.max_results = max;
    }
    Ok(query)
}

pub async fn traffic(
    client: &PceClient,
    args: TrafficArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let query = build_traffic_query(&args)?;
    let flows = client
        .traffic_flows_async(&args.name, &query, &PollOptions::default())
        .await?;

    let out = output::render_list(&global.output, &flows, |f| FlowRow::from(f), |f| {
        format!("{} -> {}", node_name(&f.src), node_name(&f.dst))
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
