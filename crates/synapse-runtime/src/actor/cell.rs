//! The harness wrapping each actor instance.
//!
//! A cell adapts an [`Actor`] into a mailbox [`Subscriber`]. The busy flag
//! is the whole concurrency story: a delivery that finds the flag set is
//! declined, which leaves the letter at the queue head for the next poll.
//! Combined with the per-subscription FIFO this yields single-threaded
//! per-actor semantics without locking across actors.

use crate::actor::{Actor, ActorContext, BoxActor};
use crate::addr::ActorAddr;
use crate::error::{Result, RuntimeError};
use crate::mailbox::{Mailbox, Subscriber};
use crate::message::{ActorMessage, CallValue, Letter};
use crate::materializer::Materializer;
use crate::supervisor::{Directive, Supervisor};
use crate::system::SystemInner;
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use synapse_protocol::{ActorId, Partition};
use tokio::sync::Mutex;

pub(crate) struct ActorCell {
    id: ActorId,
    partitions: Vec<Partition>,
    busy: AtomicBool,
    state: Mutex<BoxActor>,
    context: ActorContext,
    materializers: Arc<Vec<Arc<dyn Materializer>>>,
    supervisor: Arc<dyn Supervisor>,
}

impl ActorCell {
    pub(crate) fn spawn(
        actor: BoxActor,
        system: Weak<SystemInner>,
        mailbox: Mailbox,
        materializers: Arc<Vec<Arc<dyn Materializer>>>,
        supervisor: Arc<dyn Supervisor>,
    ) -> Arc<Self> {
        let id = actor.id();
        let partitions = actor.partitions();
        Arc::new_cyclic(|cell| Self {
            context: ActorContext::new(
                id.clone(),
                ActorAddr::new(id.clone(), mailbox),
                system,
                cell.clone(),
            ),
            id,
            partitions,
            busy: AtomicBool::new(false),
            state: Mutex::new(actor),
            materializers,
            supervisor,
        })
    }

    pub(crate) fn id(&self) -> &ActorId {
        &self.id
    }

    pub(crate) fn addr(&self) -> ActorAddr {
        self.context.addr().clone()
    }

    /// Fan out `on_initialize` and run the actor's own hook.
    pub(crate) async fn initialize(&self) {
        for materializer in self.materializers.iter() {
            let hook = materializer.on_initialize(&self.id);
            if AssertUnwindSafe(hook).catch_unwind().await.is_err() {
                tracing::error!(actor = %self.id, "materializer panicked in on_initialize");
            }
        }

        let mut state = self.state.lock().await;
        let hook = state.initialized(&self.context);
        if AssertUnwindSafe(hook).catch_unwind().await.is_err() {
            tracing::error!(actor = %self.id, "initialized hook panicked");
        }
    }

    /// Cancel timers and clear topic bookkeeping.
    pub(crate) async fn release(&self) {
        self.context.release().await;
    }

    async fn dispatch(&self, message: &ActorMessage) -> Result<CallValue> {
        let mut state = self.state.lock().await;
        let invocation = state.dispatch(&self.context, message.method(), message.args());
        match AssertUnwindSafe(invocation).catch_unwind().await {
            Ok(Some(Ok(value))) => Ok(value),
            Ok(Some(Err(error))) => Err(RuntimeError::Handler(error.to_string())),
            Ok(None) => Err(RuntimeError::MethodNotFound(message.method().to_string())),
            Err(panic) => Err(RuntimeError::HandlerPanic(panic_message(panic))),
        }
    }

    async fn fan_out_before(&self, message: &ActorMessage) {
        for materializer in self.materializers.iter() {
            let hook = materializer.on_before_message(&self.id, message);
            if AssertUnwindSafe(hook).catch_unwind().await.is_err() {
                tracing::error!(actor = %self.id, "materializer panicked in on_before_message");
            }
        }
    }

    async fn fan_out_after(&self, message: &ActorMessage) {
        for materializer in self.materializers.iter() {
            let hook = materializer.on_after_message(&self.id, message);
            if AssertUnwindSafe(hook).catch_unwind().await.is_err() {
                tracing::error!(actor = %self.id, "materializer panicked in on_after_message");
            }
        }
    }

    async fn fan_out_error(&self, message: &ActorMessage, error: &RuntimeError) {
        for materializer in self.materializers.iter() {
            let hook = materializer.on_error(&self.id, message, error);
            if AssertUnwindSafe(hook).catch_unwind().await.is_err() {
                tracing::error!(actor = %self.id, "materializer panicked in on_error");
            }
        }
    }
}

#[async_trait]
impl Subscriber for ActorCell {
    fn partitions(&self) -> Vec<Partition> {
        self.partitions.clone()
    }

    async fn on_receive_message(&self, letter: Arc<Letter>) -> bool {
        // One message in flight per actor; a concurrent delivery is declined
        // and stays queued for the next poll.
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let message = letter.content();
        self.fan_out_before(message).await;

        let consumed = match self.dispatch(message).await {
            Ok(value) => {
                message.resolve(value);
                true
            }
            Err(error) => {
                self.fan_out_error(message, &error).await;
                match self.supervisor.supervise(&self.id, &error, message).await {
                    Directive::RetryMessage => false,
                    Directive::DropMessage | Directive::Escalate => {
                        message.reject(error);
                        true
                    }
                }
            }
        };

        self.busy.store(false, Ordering::Release);
        self.fan_out_after(message).await;
        consumed
    }
}

/// Escalation link: a child whose supervisor is this cell hands failures to
/// the cell's own supervisor, forming a chain rooted at the system.
#[async_trait]
impl Supervisor for ActorCell {
    async fn supervise(
        &self,
        actor: &ActorId,
        error: &RuntimeError,
        message: &ActorMessage,
    ) -> Directive {
        self.supervisor.supervise(actor, error, message).await
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{arg, no_args, CallArgs, CallResult};
    use crate::supervisor::EscalateSupervisor;
    use std::sync::Mutex as StdMutex;
    use synapse_protocol::Message;

    struct Probe {
        id: ActorId,
        calls: Arc<StdMutex<Vec<String>>>,
        fail_times: Arc<StdMutex<u32>>,
    }

    #[async_trait]
    impl Actor for Probe {
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
                "echo" => {
                    let text = arg::<String>(&args, 0).cloned().unwrap_or_default();
                    self.calls.lock().unwrap().push(text.clone());
                    Some(Ok(Box::new(text)))
                }
                "flaky" => {
                    let mut remaining = self.fail_times.lock().unwrap();
                    if *remaining > 0 {
                        *remaining -= 1;
                        return Some(Err("transient failure".into()));
                    }
                    self.calls.lock().unwrap().push("flaky-ok".to_string());
                    Some(Ok(Box::new(())))
                }
                "explode" => panic!("boom"),
                _ => None,
            }
        }
    }

    struct RetryThenDrop {
        retries: StdMutex<u32>,
    }

    #[async_trait]
    impl Supervisor for RetryThenDrop {
        async fn supervise(
            &self,
            _actor: &ActorId,
            _error: &RuntimeError,
            _message: &ActorMessage,
        ) -> Directive {
            let mut retries = self.retries.lock().unwrap();
            if *retries > 0 {
                *retries -= 1;
                Directive::RetryMessage
            } else {
                Directive::DropMessage
            }
        }
    }

    fn cell_with(
        supervisor: Arc<dyn Supervisor>,
        materializers: Arc<Vec<Arc<dyn Materializer>>>,
    ) -> (Arc<ActorCell>, Arc<StdMutex<Vec<String>>>, Arc<StdMutex<u32>>) {
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let fail_times = Arc::new(StdMutex::new(0));
        let actor = Probe {
            id: ActorId::new("probe"),
            calls: calls.clone(),
            fail_times: fail_times.clone(),
        };
        let cell = ActorCell::spawn(
            Box::new(actor),
            Weak::new(),
            Mailbox::new(),
            materializers,
            supervisor,
        );
        (cell, calls, fail_times)
    }

    fn call_letter(method: &str, args: CallArgs) -> (Arc<Letter>, crate::message::ReplyReceiver) {
        let (message, reply) = ActorMessage::call(method, args);
        (
            Arc::new(Message::new(Partition::new("probe"), message)),
            reply,
        )
    }

    #[tokio::test]
    async fn test_success_resolves_caller() {
        let (cell, calls, _) = cell_with(Arc::new(EscalateSupervisor), Arc::new(Vec::new()));
        let (letter, reply) = call_letter("echo", crate::args!["hi".to_string()]);

        assert!(cell.on_receive_message(letter).await);
        let value = reply.await.unwrap().unwrap();
        assert_eq!(*value.downcast::<String>().unwrap(), "hi");
        assert_eq!(calls.lock().unwrap().clone(), vec!["hi"]);
    }

    #[tokio::test]
    async fn test_missing_method_rejects() {
        let (cell, _, _) = cell_with(Arc::new(EscalateSupervisor), Arc::new(Vec::new()));
        let (letter, reply) = call_letter("nope", no_args());

        assert!(cell.on_receive_message(letter).await);
        let error = reply.await.unwrap().unwrap_err();
        assert!(error.to_string().contains("Method nope not found"));
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let (cell, _, _) = cell_with(Arc::new(EscalateSupervisor), Arc::new(Vec::new()));
        let (letter, reply) = call_letter("explode", no_args());

        assert!(cell.on_receive_message(letter).await);
        let error = reply.await.unwrap().unwrap_err();
        assert!(error.to_string().contains("boom"));

        // The cell is still usable after a panic
        let (letter, reply) = call_letter("echo", crate::args!["next".to_string()]);
        assert!(cell.on_receive_message(letter).await);
        assert!(reply.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_retry_keeps_reply_pending() {
        let supervisor = Arc::new(RetryThenDrop {
            retries: StdMutex::new(1),
        });
        let (cell, calls, fail_times) = cell_with(supervisor, Arc::new(Vec::new()));
        *fail_times.lock().unwrap() = 1;

        let (letter, reply) = call_letter("flaky", no_args());

        // First delivery fails, supervisor asks for a retry: not consumed
        assert!(!cell.on_receive_message(letter.clone()).await);

        // Second delivery succeeds and resolves the original reply
        assert!(cell.on_receive_message(letter).await);
        assert!(reply.await.unwrap().is_ok());
        assert_eq!(calls.lock().unwrap().clone(), vec!["flaky-ok"]);
    }

    #[tokio::test]
    async fn test_drop_rejects_caller() {
        let supervisor = Arc::new(RetryThenDrop {
            retries: StdMutex::new(0),
        });
        let (cell, _, fail_times) = cell_with(supervisor, Arc::new(Vec::new()));
        *fail_times.lock().unwrap() = 5;

        let (letter, reply) = call_letter("flaky", no_args());
        assert!(cell.on_receive_message(letter).await);
        assert!(reply.await.unwrap().is_err());
    }

    struct RecordingMaterializer {
        name: &'static str,
        events: Arc<StdMutex<Vec<String>>>,
    }

    #[async_trait]
    impl Materializer for RecordingMaterializer {
        async fn on_initialize(&self, _actor: &ActorId) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:initialize", self.name));
        }

        async fn on_before_message(&self, _actor: &ActorId, _message: &ActorMessage) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:before", self.name));
        }

        async fn on_after_message(&self, _actor: &ActorId, _message: &ActorMessage) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:after", self.name));
        }

        async fn on_error(&self, _actor: &ActorId, _message: &ActorMessage, _error: &RuntimeError) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}:error", self.name));
        }
    }

    #[tokio::test]
    async fn test_materializer_fan_out_order() {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let materializers: Arc<Vec<Arc<dyn Materializer>>> = Arc::new(vec![
            Arc::new(RecordingMaterializer {
                name: "m1",
                events: events.clone(),
            }),
            Arc::new(RecordingMaterializer {
                name: "m2",
                events: events.clone(),
            }),
        ]);

        let (cell, _, _) = cell_with(Arc::new(EscalateSupervisor), materializers);
        cell.initialize().await;

        let (letter, reply) = call_letter("echo", crate::args!["x".to_string()]);
        cell.on_receive_message(letter).await;
        reply.await.unwrap().unwrap();

        assert_eq!(
            events.lock().unwrap().clone(),
            vec![
                "m1:initialize",
                "m2:initialize",
                "m1:before",
                "m2:before",
                "m1:after",
                "m2:after",
            ]
        );
    }

    #[tokio::test]
    async fn test_materializer_error_hook_fires() {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let materializers: Arc<Vec<Arc<dyn Materializer>>> = Arc::new(vec![Arc::new(
            RecordingMaterializer {
                name: "m",
                events: events.clone(),
            },
        )]);

        let (cell, _, _) = cell_with(Arc::new(EscalateSupervisor), materializers);
        let (letter, reply) = call_letter("nope", no_args());
        cell.on_receive_message(letter).await;
        assert!(reply.await.unwrap().is_err());

        assert_eq!(
            events.lock().unwrap().clone(),
            vec!["m:before", "m:error", "m:after"]
        );
    }

    struct PanickingMaterializer;

    #[async_trait]
    impl Materializer for PanickingMaterializer {
        async fn on_before_message(&self, _actor: &ActorId, _message: &ActorMessage) {
            panic!("materializer bug");
        }
    }

    #[tokio::test]
    async fn test_materializer_panic_is_swallowed() {
        let materializers: Arc<Vec<Arc<dyn Materializer>>> =
            Arc::new(vec![Arc::new(PanickingMaterializer)]);
        let (cell, _, _) = cell_with(Arc::new(EscalateSupervisor), materializers);

        let (letter, reply) = call_letter("echo", crate::args!["still works".to_string()]);
        assert!(cell.on_receive_message(letter).await);
        assert!(reply.await.unwrap().is_ok());
    }
}
