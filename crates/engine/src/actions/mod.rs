// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The built-in action catalog
//!
//! Message I/O, moderation, role and channel lifecycle, DMs, state
//! mutation, timing, pipes, emit, metrics, and logging. Control flow
//! lives in the executor, not here. Every handler parses its own fields
//! from the raw action record; expression-typed fields are evaluated
//! against the context before use.

mod message;
mod misc;
mod moderation;
mod pipes;
mod state;
mod timing;

use crate::handler;
use crate::registry::ActionRegistry;
use weft_core::Clock;

/// Registry with the full built-in catalog registered.
pub fn builtin_registry<C: Clock>() -> ActionRegistry<C> {
    let mut registry = ActionRegistry::new();

    // Message I/O
    registry.register("reply", handler!(message::reply));
    registry.register("send_message", handler!(message::send_message));
    registry.register("edit_message", handler!(message::edit_message));
    registry.register("delete_message", handler!(message::delete_message));
    registry.register("bulk_delete", handler!(message::bulk_delete));
    registry.register("add_reaction", handler!(message::add_reaction));
    registry.register("remove_reaction", handler!(message::remove_reaction));
    registry.register("dm", handler!(message::dm));

    // Moderation and guild lifecycle
    registry.register("kick", handler!(moderation::kick));
    registry.register("ban", handler!(moderation::ban));
    registry.register("timeout", handler!(moderation::timeout));
    registry.register("add_role", handler!(moderation::add_role));
    registry.register("remove_role", handler!(moderation::remove_role));
    registry.register("create_role", handler!(moderation::create_role));
    registry.register("delete_role", handler!(moderation::delete_role));
    registry.register("create_channel", handler!(moderation::create_channel));
    registry.register("delete_channel", handler!(moderation::delete_channel));

    // State
    registry.register("set", handler!(state::set));
    registry.register("delete", handler!(state::delete));
    registry.register("state_get", handler!(state::state_get));
    registry.register("increment", handler!(state::increment));
    registry.register("decrement", handler!(state::decrement));
    registry.register("list_push", handler!(state::list_push));
    registry.register("list_remove", handler!(state::list_remove));
    registry.register("db_insert", handler!(state::db_insert));
    registry.register("db_query", handler!(state::db_query));
    registry.register("db_update", handler!(state::db_update));
    registry.register("db_delete", handler!(state::db_delete));

    // Timing
    registry.register("wait", handler!(timing::wait));
    registry.register("create_timer", handler!(timing::create_timer));
    registry.register("cancel_timer", handler!(timing::cancel_timer));

    // Pipes
    registry.register("pipe_send", handler!(pipes::pipe_send));
    registry.register("pipe_request", handler!(pipes::pipe_request));
    registry.register("pipe_connect", handler!(pipes::pipe_connect));
    registry.register("pipe_disconnect", handler!(pipes::pipe_disconnect));

    // Events, metrics, logging, locale
    registry.register("emit", handler!(misc::emit));
    registry.register("log", handler!(misc::log));
    registry.register("metric_increment", handler!(misc::metric_increment));
    registry.register("metric_gauge", handler!(misc::metric_gauge));
    registry.register("metric_record", handler!(misc::metric_record));
    registry.register("locale_get", handler!(misc::locale_get));

    registry
}
