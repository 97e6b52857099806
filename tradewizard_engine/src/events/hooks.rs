use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, TransactionResolvedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub transaction_resolved_producer: Vec<EventProducer<TransactionResolvedEvent>>,
}

pub struct EventHandlers {
    pub on_transaction_resolved: Option<EventHandler<TransactionResolvedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_transaction_resolved = hooks.on_transaction_resolved.map(|f| EventHandler::new(buffer_size, f));
        Self { on_transaction_resolved }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_transaction_resolved {
            result.transaction_resolved_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_transaction_resolved {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_transaction_resolved: Option<Handler<TransactionResolvedEvent>>,
}

impl EventHooks {
    pub fn on_transaction_resolved<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(TransactionResolvedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_transaction_resolved = Some(Arc::new(f));
        self
    }
}
