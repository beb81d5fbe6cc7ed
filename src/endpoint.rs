use crate::error::RouteError;
use crate::handler::BoxHandler;
use crate::http::Method;

/// An HTTP routing endpoint.
#[derive(Clone)]
pub struct Endpoint {
  /// the handler service.
  pub(crate) handler: BoxHandler,

  /// the routing pattern used for handler nodes
  pub(crate) pattern: String,

  /// the parameter keys recorded on handler nodes
  pub(crate) param_keys: Vec<String>,

  // mount points register the bare prefix as a stub, hidden from listings
  pub(crate) stub: bool,
}

impl Endpoint {
  pub fn handler(&self) -> &BoxHandler {
    &self.handler
  }

  pub fn pattern(&self) -> &str {
    &self.pattern
  }

  pub fn param_keys(&self) -> &[String] {
    &self.param_keys
  }
}

/// The endpoints of a node, by method.
///
/// The "any method" entry (`None`) has its own slot and only answers when no
/// entry for the exact method exists. Entries keep registration order.
#[derive(Clone, Default)]
pub(crate) struct Endpoints {
  any: Option<Endpoint>,
  methods: Vec<(Method, Endpoint)>,
}

impl Endpoints {
  pub(crate) fn is_empty(&self) -> bool {
    self.any.is_none() && self.methods.is_empty()
  }

  /// Resolves the endpoint serving `method`.
  pub(crate) fn get(&self, method: &Method) -> Option<&Endpoint> {
    self
      .methods
      .iter()
      .find(|(m, _)| m == method)
      .map(|(_, ep)| ep)
      .or(self.any.as_ref())
  }

  /// The endpoint registered in exactly this slot.
  pub(crate) fn slot(&self, method: Option<&Method>) -> Option<&Endpoint> {
    match method {
      None => self.any.as_ref(),
      Some(method) => self.methods.iter().find(|(m, _)| m == method).map(|(_, ep)| ep),
    }
  }

  pub(crate) fn insert(&mut self, method: Option<Method>, endpoint: Endpoint) -> Result<(), RouteError> {
    if self.slot(method.as_ref()).is_some() {
      return Err(RouteError::conflict(method.as_ref(), &endpoint.pattern));
    }

    match method {
      None => self.any = Some(endpoint),
      Some(method) => self.methods.push((method, endpoint)),
    }
    Ok(())
  }

  /// Methods with an entry of their own.
  pub(crate) fn allowed(&self) -> impl Iterator<Item = &Method> {
    self.methods.iter().map(|(m, _)| m)
  }

  pub(crate) fn iter(&self) -> impl Iterator<Item = (Option<&Method>, &Endpoint)> {
    self
      .any
      .iter()
      .map(|ep| (None, ep))
      .chain(self.methods.iter().map(|(m, ep)| (Some(m), ep)))
  }
}
