//! Object command handlers: get, show, create, update, delete, bulk.

use pce_api::model::GenericObject;
use pce_api::{ApiErrorDetail, BulkOutcome, ObjectKind, PceClient, PollOptions, Query};
use serde_json::Value;
use strum::IntoEnumIterator;
use tabled::Tabled;

use crate::cli::{BulkAction, BulkArgs, CreateArgs, GetArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ObjectRow {
    #[tabled(rename = "Href")]
    href: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Updated")]
    updated_at: String,
}

fn field(object: &GenericObject, key: &str) -> String {
    object
        .fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

impl From<&GenericObject> for ObjectRow {
    fn from(o: &GenericObject) -> Self {
        // Labels carry key/value instead of a name.
        let name = o.name().map_or_else(
            || {
                let (key, value) = (field(o, "key"), field(o, "value"));
                if key.is_empty() {
                    field(o, "hostname")
                } else {
                    format!("{key}={value}")
                }
            },
            str::to_owned,
        );
        Self {
            href: object_href(o),
            name,
            description: field(o, "description"),
            updated_at: field(o, "updated_at"),
        }
    }
}

fn object_href(o: &GenericObject) -> String {
    o.href.as_ref().map(ToString::to_string).unwrap_or_default()
}

#[derive(Tabled)]
struct KindRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Collection")]
    collection: &'static str,
    #[tabled(rename = "Versioned")]
    versioned: bool,
    #[tabled(rename = "Bulk")]
    bulk: bool,
    #[tabled(rename = "Parent")]
    parent: String,
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Href")]
    href: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Errors")]
    errors: String,
}

impl OutcomeRow {
    fn from_json(v: &Value) -> Self {
        let text = |key: &str| v[key].as_str().unwrap_or_default().to_owned();
        let errors = v["errors"]
            .as_array()
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|e| serde_json::from_value::<ApiErrorDetail>(e.clone()).ok())
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_default();
        let result = match text("status") {
            status if !status.is_empty() => status,
            _ if v["success"].as_bool().unwrap_or_default() => "ok".into(),
            _ => "failed".into(),
        };
        Self {
            href: text("href"),
            result,
            errors,
        }
    }
}

fn outcome_json(outcome: &BulkOutcome) -> Value {
    match outcome {
        BulkOutcome::Succeeded { href, status } => {
            serde_json::json!({ "success": true, "href": href, "status": status })
        }
        BulkOutcome::Failed {
            href,
            status,
            errors,
        } => serde_json::json!({
            "success": false,
            "href": href,
            "status": status,
            "errors": errors,
        }),
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn kinds(global: &GlobalOpts) {
    let kinds: Vec<ObjectKind> = ObjectKind::iter().collect();
    let out = output::render_list(
        &global.output,
        &kinds,
        |k| {
            let endpoint = k.endpoint();
            KindRow {
                kind: k.to_string(),
                collection: endpoint.collection,
                versioned: k.is_versioned(),
                bulk: endpoint.bulk,
                parent: endpoint.parent.map(|p| p.to_string()).unwrap_or_default(),
            }
        },
        ToString::to_string,
    );
    output::print_output(&out, global.quiet);
}

pub async fn get(client: &PceClient, args: GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let kind = util::parse_kind(&args.kind)?;

    let mut query = Query::new();
    if let Some(name) = args.name {
        query = query.param("name", name);
    }
    for raw in &args.params {
        let (key, value) = util::parse_param(raw)?;
        query = query.param(key, value);
    }
    if args.active {
        query = query.active();
    }
    if let Some(ref parent) = args.parent {
        query = query.parent(util::parse_href(parent)?);
    }
    if let Some(max) = args.max_results {
        query = query.max_results(max);
    }

    let api = client.objects_of(kind);
    let objects = if args.via_job {
        api.get_async(&query, &PollOptions::default()).await?
    } else if args.all {
        api.get_all(&query).await?
    } else {
        api.get(&query).await?
    };

    let out = output::render_list(&global.output, &objects, |o| ObjectRow::from(o), object_href);
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn show(client: &PceClient, raw: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let href = util::parse_href(raw)?;
    let kind = util::kind_of(&href)?;
    let object = client.objects_of(kind).get_by_reference(&href).await?;
    let out = output::render_single(&global.output, &object, object_href);
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn create(
    client: &PceClient,
    args: CreateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let kind = util::parse_kind(&args.kind)?;
    let body: GenericObject = serde_json::from_value(util::read_json_file(&args.file)?)?;

    let api = client.objects_of(kind);
    let created = match args.parent {
        Some(ref parent) => api.create_in(&util::parse_href(parent)?, &body).await?,
        None => api.create(&body).await?,
    };
    let out = output::render_single(&global.output, &created, object_href);
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn update(
    client: &PceClient,
    raw: &str,
    file: &std::path::Path,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let href = util::parse_href(raw)?;
    let kind = util::kind_of(&href)?;
    let body = util::read_json_file(file)?;
    client.objects_of(kind).update(&href, &body).await?;
    if !global.quiet {
        let color = output::should_color(&global.color);
        eprintln!("{}", output::success(&format!("Updated {}", href.to_draft()), color));
    }
    Ok(())
}

pub async fn delete(client: &PceClient, raw: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let href = util::parse_href(raw)?;
    let kind = util::kind_of(&href)?;
    client.objects_of(kind).delete(&href).await?;
    if !global.quiet {
        let color = output::should_color(&global.color);
        eprintln!("{}", output::success(&format!("Deleted {href}"), color));
    }
    Ok(())
}

pub async fn bulk(client: &PceClient, args: BulkArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let kind = util::parse_kind(&args.kind)?;
    let items = util::read_json_array(&args.file)?;
    let api = client.objects_of(kind);

    let outcomes = match args.action {
        BulkAction::Create => {
            let objects = items
                .into_iter()
                .map(serde_json::from_value::<GenericObject>)
                .collect::<Result<Vec<_>, _>>()?;
            api.bulk_create(&objects).await?
        }
        BulkAction::Update => api.bulk_update(&items).await?,
        BulkAction::Delete => api.bulk_delete(&items).await?,
    };

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    let rendered: Vec<Value> = outcomes.iter().map(outcome_json).collect();
    let out = output::render_list(&global.output, &rendered, OutcomeRow::from_json, |v| {
        v["href"].as_str().unwrap_or_default().to_owned()
    });
    output::print_output(&out, global.quiet);

    if failed > 0 && !global.quiet {
        let color = output::should_color(&global.color);
        eprintln!(
            "{}",
            output::warning(&format!("{failed} of {} items failed", outcomes.len()), color)
        );
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pce_api::Href;

    #[test]
    fn outcome_rows_show_status_and_errors() {
        let ok = BulkOutcome::Succeeded {
            href: Href::parse("/orgs/1/workloads/4").unwrap(),
            status: None,
        };
        let failed = BulkOutcome::Failed {
            href: None,
            status: Some("validation_failure".into()),
            errors: vec![ApiErrorDetail {
                token: Some("invalid_hostname".into()),
                message: Some("bad name".into()),
            }],
        };

        let ok_row = OutcomeRow::from_json(&outcome_json(&ok));
        assert_eq!(ok_row.href, "/orgs/1/workloads/4");
        assert_eq!(ok_row.result, "ok");

        let failed_row = OutcomeRow::from_json(&outcome_json(&failed));
        assert_eq!(failed_row.href, "");
        assert_eq!(failed_row.result, "validation_failure");
        assert_eq!(failed_row.errors, "invalid_hostname: bad name");
    }

    #[test]
    fn label_rows_use_key_and_value() {
        let label: GenericObject = serde_json::from_value(serde_json::json!({
            "href": "/orgs/1/labels/7",
            "key": "env",
            "value": "prod",
        }))
        .unwrap();
        let row = ObjectRow::from(&label);
        assert_eq!(row.name, "env=prod");
        assert_eq!(row.href, "/orgs/1/labels/7");
    }
}
