//! Blink example: two actors, a timer and the pub/sub bridge.
//!
//! - **led** toggles an LED on a repeating timer and takes `Blink` commands
//!   from the network to change the interval. The interval is also a
//!   writable property, set through `demo/led/set`.
//! - **sys** publishes the node's uptime every second and tells the LED to
//!   speed up after a while.
//!
//! Outbound payloads go to a channel transport and are printed as they
//! arrive. Run with `RUST_LOG=limero_runtime=debug` to watch the lifecycle.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use limero_codec::{to_snapshot, Codec, Format, JsonCodec};
use limero_runtime::{
    message, Actor, ActorConfig, ActorContext, ChannelTransport, Handlers, PropMode, PropType,
    PropertyInfo, Result, Runtime, RuntimeConfig, TimerHandle,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Blink {
    interval_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
struct Uptime {
    seconds: u64,
}

message!(Blink, Uptime);

struct Led {
    on: bool,
    toggles: u64,
    timer: Option<TimerHandle>,
}

impl Led {
    fn restart(&mut self, ctx: &mut ActorContext, interval_ms: u64) {
        if let Some(timer) = self.timer.take() {
            ctx.timers().cancel(timer);
        }
        self.timer = Some(ctx.timers().repeating(Duration::from_millis(interval_ms)));
    }

    async fn blink(&mut self, ctx: &mut ActorContext, msg: Blink) -> Result<()> {
        self.restart(ctx, msg.interval_ms);
        ctx.props().insert("interval_ms", msg.interval_ms as i64)?;
        ctx.publish_props()
    }
}

#[async_trait(?Send)]
impl Actor for Led {
    fn handlers() -> Handlers<Self> {
        Handlers::<Self>::new().on::<Blink>(|led, ctx, msg| Box::pin(led.blink(ctx, msg)))
    }

    async fn on_start(&mut self, ctx: &mut ActorContext) -> Result<()> {
        let topic = format!("{}/{}/Blink", ctx.device(), ctx.name());
        ctx.subscribe::<Blink>(&topic)?;
        self.timer = Some(ctx.timers().repeating(Duration::from_millis(500)));
        ctx.declare(
            PropertyInfo::new("interval_ms", PropType::Uint, PropMode::ReadWrite)
                .description("Blink interval"),
            500,
        )?;
        ctx.props().insert("on", false)?;
        ctx.publish_info()
    }

    async fn on_props(&mut self, ctx: &mut ActorContext, _changed: &[String]) -> Result<()> {
        let interval_ms = ctx.props().get("interval_ms")?.to::<u64>()?;
        self.restart(ctx, interval_ms);
        Ok(())
    }

    async fn on_timer(&mut self, ctx: &mut ActorContext, _timer: TimerHandle) -> Result<()> {
        self.on = !self.on;
        self.toggles += 1;
        ctx.props().insert("on", self.on)?;
        Ok(())
    }

    async fn on_stop(&mut self, ctx: &mut ActorContext) {
        println!("[led] stopped after {} toggles", self.toggles);
        let _ = ctx.publish_props();
    }
}

struct Sys {
    booted: Instant,
}

#[async_trait(?Send)]
impl Actor for Sys {
    fn handlers() -> Handlers<Self> {
        Handlers::<Self>::new()
    }

    async fn on_start(&mut self, ctx: &mut ActorContext) -> Result<()> {
        ctx.timers().repeating(Duration::from_secs(1));
        Ok(())
    }

    async fn on_timer(&mut self, ctx: &mut ActorContext, _timer: TimerHandle) -> Result<()> {
        let seconds = self.booted.elapsed().as_secs();
        ctx.announce(&Uptime { seconds })?;
        if seconds == 2 {
            ctx.emit("led", Blink { interval_ms: 100 }).await?;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== limero blink ===\n");

    let config = RuntimeConfig {
        device: "demo".to_string(),
        wire_format: Format::JSON,
        ..RuntimeConfig::default()
    };
    let (transport, mut outbound) = ChannelTransport::pair(64);
    let mut runtime = Runtime::new(config, transport);

    runtime.spawn(ActorConfig::new("led").priority(5), || Led {
        on: false,
        toggles: 0,
        timer: None,
    })?;
    runtime.spawn(ActorConfig::new("sys").mailbox_capacity(4), || Sys {
        booted: Instant::now(),
    })?;
    runtime.seal().await;

    let printer = tokio::spawn(async move {
        while let Some(out) = outbound.recv().await {
            println!("[net] {} {}", out.topic, String::from_utf8_lossy(&out.payload));
        }
    });

    // a command arriving from the network
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let command = to_snapshot(&Blink { interval_ms: 250 })?;
    let payload = JsonCodec.encode(&command, &Format::JSON)?;
    let report = runtime.bridge().deliver("demo/led/Blink", &payload).await?;
    println!("[net] command delivered to {} actor(s)", report.delivered());
    for failure in report.failures() {
        println!("[net] {} refused {}: {:?}", failure.actor, failure.message, failure.outcome);
    }

    // and a property write
    let write = serde_json::json!({ "interval_ms": 50 });
    let payload = JsonCodec.encode(&to_snapshot(&write)?, &Format::JSON)?;
    runtime.bridge().deliver("demo/led/set", &payload).await?;

    tokio::time::sleep(Duration::from_secs(3)).await;

    runtime.shutdown().await;
    for name in runtime.registry().names() {
        if let Some(actor) = runtime.actor(&name) {
            let stats = actor.stats();
            println!(
                "[{}] delivered={} dropped_fires={} discarded={}",
                name,
                stats.delivered(),
                stats.timer_fires_dropped(),
                stats.discarded_on_stop()
            );
        }
    }

    drop(runtime);
    let _ = printer.await;
    println!("\n=== Done ===");
    Ok(())
}
