//--------------------------------------------------------------------------
// (C) Copyright Travis Sharp <travis@kuipersys.com>.  All rights reserved.
//--------------------------------------------------------------------------

mod cmd;
mod formatter;
mod host;
mod logging;
mod services;

use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context as _};
use clap::Parser;
use cmd::{Cli, Command, InvokeArgs};
use host::TerminalHost;
use pyx_runtime::{
    config::SessionConfig,
    handler::{EventHandler, HandlerType},
    session::SessionState,
    ClientSession, ClientSessionBuilder,
};
use pyx_runtime_sdk::{
    model::{
        message::{events, CallId, FunctionReturn},
        value::PreloadPlan,
    },
    PyxResult,
};
use serde_json::Value;
use services::{connection::ConnectionService, HostedService};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Forwards every function return to the command waiting on it.
struct ReturnObserver {
    returns: UnboundedSender<FunctionReturn>,
}

impl EventHandler for ReturnObserver {
    fn get_type(&self) -> HandlerType {
        HandlerType::Observer
    }

    fn handle(&self, _: &Arc<SessionState>, data: &Value) -> PyxResult<()> {
        let result: FunctionReturn = serde_json::from_value(data.clone())?;
        // the receiver is gone once the command has its answer
        let _ = self.returns.send(result);
        Ok(())
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<SessionConfig> {
    let Some(path) = &cli.config else {
        return Ok(SessionConfig::default());
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    serde_json::from_str(&text).with_context(|| format!("Invalid config file {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.otel);

    let config = load_config(&cli)?;
    tracing::debug!(?config, "session configuration");

    let (tx, rx) = unbounded_channel();
    let mut builder = ClientSessionBuilder::new(Arc::new(tx));
    builder.with_config(config);

    let returns = match &cli.command {
        Command::Invoke(_) => {
            let (returns_tx, returns_rx) = unbounded_channel();
            let observer = ReturnObserver { returns: returns_tx };
            builder.register_handler(events::FUNCTION_RETURN, Arc::new(observer));
            Some(returns_rx)
        }
        Command::Watch => None,
    };

    let session = Arc::new(builder.build());
    let service = Arc::new(ConnectionService::connect(&cli.url, session.clone(), rx).await?);
    service.start().await?;

    let result = match (&cli.command, returns) {
        (Command::Invoke(args), Some(returns)) => {
            invoke(&cli, args, &session, &service, returns).await
        }
        _ => watch(&cli, &session, &service).await,
    };

    service.stop().await?;
    result
}

async fn watch(
    cli: &Cli,
    session: &Arc<ClientSession>,
    service: &Arc<ConnectionService>,
) -> anyhow::Result<()> {
    let host = TerminalHost::new(cli.output, cli.pretty);
    let weak = Arc::downgrade(session);

    {
        let host = host.clone();
        session.watch_root(move |id| {
            if let Some(session) = weak.upgrade() {
                host.mount_root(session.view(&id));
            }
        });
    }

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for ctrl-c")?;
            tracing::info!("interrupted, disconnecting");
        }
        _ = service.closed() => {
            tracing::warn!("connection closed by server");
        }
    }

    Ok(())
}

async fn invoke(
    cli: &Cli,
    args: &InvokeArgs,
    session: &Arc<ClientSession>,
    service: &Arc<ConnectionService>,
    mut returns: UnboundedReceiver<FunctionReturn>,
) -> anyhow::Result<()> {
    let plan = args
        .plan
        .clone()
        .map(PreloadPlan::from_json)
        .transpose()
        .context("Invalid preload plan")?;

    let call_id: CallId = session
        .function(&args.function, plan)
        .call(args.args.clone())
        .with_context(|| format!("Failed to call {}", args.function))?;

    let wait = async {
        loop {
            tokio::select! {
                result = returns.recv() => match result {
                    Some(result) if result.call_id == call_id => return Ok(result.value),
                    Some(_) => continue,
                    None => bail!("Session dropped before {} returned", call_id),
                },
                _ = service.closed() => bail!("Connection closed before {} returned", call_id),
            }
        }
    };

    let value = tokio::time::timeout(Duration::from_secs(args.timeout), wait)
        .await
        .with_context(|| format!("Timed out after {}s waiting for {}", args.timeout, call_id))??;

    formatter::print_output(&value, cli.output, cli.pretty)
}
