//! Consolidate a server from every scope it lives in into one target scope.
//!
//! The target is written before any source is touched. If that add fails the
//! sources stay exactly as they were; once it succeeds, each source is cleaned
//! up independently and failures are collected rather than rolled back.

use serde_json::Value;

use crate::client::ClientPlugin;
use crate::error::{McpmError, Result};
use crate::types::{OperationResult, ServerConfig, ServerState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescopeOptions {
    /// Report the plan without writing anything.
    pub dry_run: bool,
}

pub fn rescope(
    client: &ClientPlugin,
    id: &str,
    target: &str,
    options: RescopeOptions,
) -> OperationResult {
    try_rescope(client, id, target, options).unwrap_or_else(OperationResult::from)
}

fn try_rescope(
    client: &ClientPlugin,
    id: &str,
    target: &str,
    options: RescopeOptions,
) -> Result<OperationResult> {
    if client.get_scope_handler(target).is_none() {
        return Err(McpmError::UnknownScope {
            client: client.name().to_string(),
            scope: target.to_string(),
        });
    }

    let sources = client.find_server_scopes(id)?;
    let Some(primary) = sources.first() else {
        return Err(McpmError::not_found(
            id,
            format!("in any scope of client '{}'", client.name()),
        ));
    };
    let canonical = primary
        .entry(id)?
        .ok_or_else(|| McpmError::not_found(id, format!("in scope '{}'", primary.name())))?;
    let was_disabled = primary.server_state(id)? == ServerState::Disabled;

    let source_names: Vec<&str> = sources.iter().map(|h| h.name()).collect();
    let target_is_source = source_names.contains(&target);
    let remove_from: Vec<&str> = source_names
        .iter()
        .copied()
        .filter(|name| *name != target)
        .collect();

    let plan = |result: OperationResult| {
        result
            .with_data("server", id)
            .with_data("target", target)
            .with_data("sources", strings(&source_names))
            .with_data("primary_source", primary.name())
            .with_data("remove_from", strings(&remove_from))
            .with_data("add_to_target", !target_is_source)
            .with_data("was_disabled", was_disabled)
            .with_data("dry_run", options.dry_run)
    };

    if options.dry_run {
        let message = if target_is_source && remove_from.is_empty() {
            format!("'{id}' already lives only in scope '{target}'")
        } else {
            format!(
                "Would move '{id}' to scope '{target}' (from: {})",
                source_names.join(", ")
            )
        };
        return Ok(plan(OperationResult::ok(message)).with_data("changed", false));
    }

    if !target_is_source {
        let config = ServerConfig::from_entry(&canonical)
            .map_err(|e| McpmError::Validation(vec![format!("server '{id}': {e}")]))?;
        let added = client.add_server(id, &config, target);
        if !added.success {
            tracing::warn!(server = id, scope = target, "rescope aborted, sources left untouched");
            let failed = OperationResult::failure(
                format!(
                    "Rescope aborted: could not add '{id}' to scope '{target}': {}",
                    added.message
                ),
                added.errors,
            );
            return Ok(plan(failed).with_data("changed", false));
        }
    }

    let mut removed = Vec::new();
    let mut errors = Vec::new();
    for name in &remove_from {
        let result = client.remove_server(id, name);
        if result.success {
            removed.push(*name);
        } else {
            tracing::warn!(
                server = id,
                scope = name,
                error = %result.message,
                "rescope left a copy behind"
            );
            errors.extend(result.errors);
        }
    }

    let changed = !target_is_source || !removed.is_empty();
    let result = if errors.is_empty() {
        tracing::info!(server = id, scope = target, sources = ?source_names, "rescoped server");
        OperationResult::ok(format!(
            "Moved '{id}' to scope '{target}' (from: {})",
            source_names.join(", ")
        ))
    } else {
        OperationResult::failure(
            format!(
                "'{id}' is now in scope '{target}' but could not be removed from every source"
            ),
            errors,
        )
        .with_data("partial", true)
    };
    Ok(plan(result)
        .with_data("removed_from", strings(&removed))
        .with_data("changed", changed))
}

fn strings(names: &[&str]) -> Value {
    Value::from(names.iter().map(|n| n.to_string()).collect::<Vec<_>>())
}
