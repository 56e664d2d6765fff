//! Actor runtime demonstration
//!
//! Shows how to define stateful actors, call them through their addresses
//! and fan a notification out over a topic.

use async_trait::async_trait;
use synapse_runtime::{
    arg, args, no_args, Actor, ActorContext, ActorId, ActorSystem, CallArgs, CallResult,
    SystemConfig, Topic,
};

// Counter actor that maintains state
struct CounterActor {
    id: ActorId,
    count: u64,
}

#[async_trait]
impl Actor for CounterActor {
    fn id(&self) -> ActorId {
        self.id.clone()
    }

    async fn dispatch(
        &mut self,
        _ctx: &ActorContext,
        method: &str,
        args: CallArgs,
    ) -> Option<CallResult> {
        match method {
            "increment" => {
                let amount = arg::<u64>(&args, 0).copied().unwrap_or(1);
                self.count += amount;
                println!("[{}] count increased by {} to {}", self.id, amount, self.count);
                Some(Ok(Box::new(self.count)))
            }
            "count" => Some(Ok(Box::new(self.count))),
            "announce" => {
                let text = arg::<String>(&args, 0).cloned().unwrap_or_default();
                println!("[{}] heard announcement: {}", self.id, text);
                Some(Ok(Box::new(())))
            }
            _ => None,
        }
    }
}

/// Protocol marker for the announcements topic.
enum Announcements {}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let system = ActorSystem::with(SystemConfig::default()).await;

    println!("=== Actor Runtime Demo ===\n");

    let counter1 = system
        .actor_of(CounterActor {
            id: ActorId::new("counter-1"),
            count: 0,
        })
        .await
        .expect("spawn counter-1");

    let counter2 = system
        .actor_of(CounterActor {
            id: ActorId::new("counter-2"),
            count: 100,
        })
        .await
        .expect("spawn counter-2");

    println!("--- Calling actors ---\n");

    let count: u64 = counter1.call("increment", args![10u64]).await.expect("increment");
    println!("counter-1 replied with {count}");

    counter1.call::<u64>("increment", args![5u64]).await.expect("increment");
    counter2.call::<u64>("increment", args![20u64]).await.expect("increment");

    println!("\n--- Topic fan-out ---\n");

    let topic: Topic<Announcements> = Topic::new(&system, "announcements")
        .await
        .expect("create topic");
    topic
        .subscribe(counter1.addr().clone())
        .await
        .expect("subscribe counter-1");
    topic
        .subscribe(counter2.addr().clone())
        .await
        .expect("subscribe counter-2");

    topic
        .notify("announce", args!["the demo is almost over".to_string()])
        .await;

    // Give the fire-and-forget fan-out a moment to drain
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let final1: u64 = counter1.call("count", no_args()).await.expect("count");
    let final2: u64 = counter2.call("count", no_args()).await.expect("count");
    println!("\nfinal counts: counter-1={final1} counter-2={final2}");

    println!("\nShutting down...");
    system.free().await;
}
