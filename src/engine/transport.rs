use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use std::sync::Arc;

use crate::{
    client::{Error, Transport},
    engine::{Dispatch, Engine},
};

/// Stands in for the network: answers every request from the harness state.
pub(crate) struct SubstituteTransport {
    engine: Arc<Engine>,
}

impl SubstituteTransport {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Transport for SubstituteTransport {
    async fn fetch(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error> {
        let dispatch = req
            .extensions()
            .get::<Dispatch>()
            .copied()
            .unwrap_or(Dispatch::Unmatched);

        self.engine
            .log_event(&format!("Doing a request {} {}", req.method(), req.uri()));

        let mut res = self.engine.substitute(&req, dispatch)?;
        res.extensions_mut().insert(dispatch);
        Ok(res)
    }
}
