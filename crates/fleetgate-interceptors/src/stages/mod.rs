use crate::context::{CallContext, ProtoCall};
use crate::errors::{InterceptError, Rejection};
use async_trait::async_trait;
use fleetgate_auth::prelude::AuthenticatedCall;
use futures::future::BoxFuture;
use std::any::Any;

#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        cx: &CallContext,
        call: &mut dyn ProtoCall,
    ) -> Result<StageOutcome, InterceptError>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum StageOutcome {
    Continue,
    /// The stage established who is calling; later stages and the handler
    /// see this through [`CallContext::authenticated`].
    Authenticated(AuthenticatedCall),
}

pub struct InterceptorChain {
    stages: Vec<Box<dyn Stage>>,
}

impl InterceptorChain {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    pub fn builder() -> ChainBuilder {
        ChainBuilder::default()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Runs every stage in order and returns the context the handler should
    /// see. The first failing stage ends the run.
    pub async fn admit(
        &self,
        cx: CallContext,
        call: &mut dyn ProtoCall,
    ) -> Result<CallContext, InterceptError> {
        let mut cx = cx;
        for stage in &self.stages {
            let outcome = stage
                .handle(&cx, call)
                .await
                .map_err(|err| err.correlate(cx.request_id()))?;
            match outcome {
                StageOutcome::Continue => {}
                StageOutcome::Authenticated(info) => cx = cx.with_authenticated(info),
            }
        }
        Ok(cx)
    }

    /// Admits the call, then invokes `handler` once with the admitted context.
    ///
    /// A refusal never reaches the handler; if the refusing stage supplied a
    /// value of type `Rsp` it is returned inside the [`Rejection`].
    pub async fn run_with_handler<Rsp, F>(
        &self,
        cx: CallContext,
        call: &mut dyn ProtoCall,
        handler: F,
    ) -> Result<Rsp, Rejection<Rsp>>
    where
        Rsp: Any,
        F: for<'a> FnOnce(
                &'a CallContext,
                &'a mut dyn ProtoCall,
            ) -> BoxFuture<'a, Result<Rsp, InterceptError>>
            + Send,
    {
        let cx = self.admit(cx, call).await?;
        let request_id = cx.request_id().to_string();
        handler(&cx, call)
            .await
            .map_err(|err| Rejection::from(err.correlate(&request_id)))
    }
}

#[derive(Default)]
pub struct ChainBuilder {
    stages: Vec<Box<dyn Stage>>,
}

impl ChainBuilder {
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn build(self) -> InterceptorChain {
        InterceptorChain::new(self.stages)
    }
}

pub mod device_authn;
pub mod device_id_guard;
