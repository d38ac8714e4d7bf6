//! Wildcard ports that take on one concrete type while connected.
//!
//! Node types such as conditional forward, select-nth and merge declare
//! their data ports as `am::core::any`. The first connection to a concrete
//! type binds all of them to that type and retypes the node's output
//! buffers; removing the last connection unbinds them again. Connections
//! carrying a different concrete type are refused in `pre_connect` while
//! the node is bound.
//!
//! Binding only moves through the `connect`/`disconnect` hooks, so the
//! state always reflects the node's current links.

use std::sync::Arc;

use tracedfg_core::{DataType, DfgError, HookContext, TypeRef};

/// Binding state of a node's wildcard ports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Binding {
    /// No concrete type yet; every type is accepted.
    #[default]
    Unbound,
    /// All narrowed ports carry this type.
    Bound(TypeRef),
}

impl Binding {
    /// The bound type, if any.
    pub fn bound_type(&self) -> Option<&TypeRef> {
        match self {
            Binding::Unbound => None,
            Binding::Bound(t) => Some(t),
        }
    }

    /// Returns `true` once a concrete type has been bound.
    pub fn is_bound(&self) -> bool {
        matches!(self, Binding::Bound(_))
    }
}

/// Connection-driven binding of a fixed set of ports.
#[derive(Debug, Clone, Default)]
pub struct Narrowing {
    binding: Binding,
    connections: usize,
}

impl Narrowing {
    /// Creates an unbound narrowing with no connections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current binding.
    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Number of connections on the narrowed ports.
    pub fn connections(&self) -> usize {
        self.connections
    }

    /// `pre_connect` check for a narrowed port.
    pub fn admits(&self, peer_type: &DataType) -> Result<(), String> {
        match &self.binding {
            Binding::Bound(current) if !peer_type.is_any() && **current != *peer_type => {
                Err(format!(
                    "Current type of this node is '{current}', cannot connect to port with type '{peer_type}'."
                ))
            }
            _ => Ok(()),
        }
    }

    /// `connect` hook for a narrowed port.
    ///
    /// Counts the connection. The first concrete peer type binds the node
    /// and retypes every output among `ports`. If an output cannot be
    /// retyped the node is left exactly as before the call.
    pub fn bind(
        &mut self,
        ctx: &mut HookContext<'_>,
        peer_type: &TypeRef,
        ports: &[usize],
    ) -> Result<(), DfgError> {
        self.connections += 1;
        if peer_type.is_any() || self.binding.is_bound() {
            return Ok(());
        }

        for (done, &port) in ports.iter().enumerate() {
            if !ctx.is_output(port) {
                continue;
            }
            if let Err(err) = ctx.retype_output(port, Arc::clone(peer_type)) {
                self.connections -= 1;
                widen(ctx, &ports[..done])?;
                return Err(err);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("narrow: node {} bound to {}", ctx.node(), peer_type);
        self.binding = Binding::Bound(Arc::clone(peer_type));
        Ok(())
    }

    /// `disconnect` hook for a narrowed port.
    ///
    /// When the last connection goes, the node is unbound and its outputs
    /// return to their declared type.
    pub fn release(&mut self, ctx: &mut HookContext<'_>, ports: &[usize]) -> Result<(), DfgError> {
        self.connections = self.connections.saturating_sub(1);
        if self.connections > 0 || !self.binding.is_bound() {
            return Ok(());
        }

        self.binding = Binding::Unbound;
        #[cfg(feature = "tracing")]
        tracing::debug!("narrow: node {} unbound", ctx.node());
        widen(ctx, ports)
    }
}

/// Resets every output among `ports` to its declared type.
fn widen(ctx: &mut HookContext<'_>, ports: &[usize]) -> Result<(), DfgError> {
    for &port in ports {
        if !ctx.is_output(port) {
            continue;
        }
        if let Some(declared) = ctx.declared_type(port).cloned() {
            ctx.retype_output(port, declared)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_admits_everything() {
        let narrowing = Narrowing::new();
        assert!(narrowing.admits(&DataType::new::<u64>("am::core::uint64")).is_ok());
        assert!(narrowing.admits(&DataType::any()).is_ok());
        assert_eq!(narrowing.binding(), &Binding::Unbound);
    }

    #[test]
    fn test_bound_refuses_other_types() {
        let narrowing = Narrowing {
            binding: Binding::Bound(Arc::new(DataType::new::<f64>("am::core::double"))),
            connections: 1,
        };
        assert!(narrowing.admits(&DataType::new::<f64>("am::core::double")).is_ok());
        assert!(narrowing.admits(&DataType::any()).is_ok());

        let err = narrowing
            .admits(&DataType::new::<u64>("am::core::uint64"))
            .unwrap_err();
        assert_eq!(
            err,
            "Current type of this node is 'am::core::double', cannot connect to port with type 'am::core::uint64'."
        );
    }

    #[test]
    fn test_binding_accessors() {
        let t: TypeRef = Arc::new(DataType::new::<bool>("am::core::bool"));
        let bound = Binding::Bound(Arc::clone(&t));
        assert!(bound.is_bound());
        assert_eq!(bound.bound_type().map(|t| t.name()), Some("am::core::bool"));
        assert!(Binding::Unbound.bound_type().is_none());
    }
}
