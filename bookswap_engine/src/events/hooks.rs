use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{EventHandler, EventProducer, Handler, OrderEvent};

/// The sending side of every registered hook. Cheap to clone, and handed to the APIs that publish events.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_event_producers: Vec<EventProducer<OrderEvent>>,
}

impl EventProducers {
    pub async fn publish_order_event(&self, event: OrderEvent) {
        let hooks = self.order_event_producers.len();
        trace!("📬️ Publishing {:?} for order #{} to {hooks} hooks", event.kind, event.order.id);
        for producer in &self.order_event_producers {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_event: Vec<EventHandler<OrderEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_event = hooks.on_order_event.into_iter().map(|f| EventHandler::new(buffer_size, f)).collect();
        Self { on_order_event }
    }

    pub fn producers(&self) -> EventProducers {
        let order_event_producers = self.on_order_event.iter().map(|h| h.subscribe()).collect();
        EventProducers { order_event_producers }
    }

    /// Spawns a task per hook. Each task ends once every producer for it has been dropped.
    pub fn start_handlers(self) {
        debug!("📬️ Starting {} order event hooks", self.on_order_event.len());
        for handler in self.on_order_event {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_event: Vec<Handler<OrderEvent>>,
}

impl EventHooks {
    pub fn on_order_event<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_event.push(Arc::new(f));
        self
    }

    pub fn add_order_event_handler(&mut self, handler: Handler<OrderEvent>) -> &mut Self {
        self.on_order_event.push(handler);
        self
    }
}
