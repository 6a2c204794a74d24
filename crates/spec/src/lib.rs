// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! weft-spec: the declarative bot specification model
//!
//! A bot is described by a data-only document: commands, event handlers,
//! reusable flows, a state schema, scheduled jobs, and pipes. The loader
//! (YAML parsing, schema validation, import merging) is external; this
//! crate models the validated in-memory document the runtime consumes.
//! The document is immutable at runtime and hot-swapped as a unit.

pub mod action;
pub mod command;
pub mod condition;
pub mod document;
pub mod event;
pub mod flow;
pub mod pipe;
pub mod schedule;
pub mod state;

pub use action::{ActionSpec, Actions};
pub use command::{CommandDef, CommandOption, OptionType, SubcommandDef, SubcommandGroupDef};
pub use condition::Condition;
pub use document::{
    resolve_command_actions, BotSpec, ErrorBehavior, ErrorPolicyDef, MetricDecl,
    PermissionLevelDef,
};
pub use event::EventHandlerDef;
pub use flow::{FlowDef, FlowParam, ValueType};
pub use pipe::{
    HeartbeatDef, HttpPipeDef, MqttPipeDef, PipeDef, PipeKind, ReconnectDef, TcpMode, TcpPipeDef,
    UdpPipeDef, WebhookPipeDef, WsPipeDef,
};
pub use schedule::{JobDef, SchedulerDef};
pub use state::{ColumnDef, ColumnType, StateSchema, TableDef, VariableDef};
