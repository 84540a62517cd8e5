//! Command dispatch: bridges CLI args to `PceClient` calls and output formatting.

pub mod config_cmd;
pub mod objects;
pub mod provision;
pub mod util;

use pce_api::PceClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a PCE-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &PceClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Health => provision::health(client, global).await,
        Command::Get(args) => objects::get(client, args, global).await,
        Command::Show { href } => objects::show(client, &href, global).await,
        Command::Create(args) => objects::create(client, args, global).await,
        Command::Update { href, file } => objects::update(client, &href, &file, global).await,
        Command::Delete { href } => objects::delete(client, &href, global).await,
        Command::Bulk(args) => objects::bulk(client, args, global).await,
        Command::Provision(args) => provision::provision(client, args, global).await,
        Command::PairingKey { profile } => provision::pairing_key(client, &profile, global).await,
        Command::Traffic(args) => provision::traffic(client, args, global).await,
        // Handled before a client is built
        Command::Kinds | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
