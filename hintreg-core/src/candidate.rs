//! # Candidate Contract
//!
//! A candidate is one concrete implementation competing for a category. The
//! registry only needs a few things from it, all with sensible defaults:
//!
//! - the implementation hints it was built with, used for compatibility checks
//! - whether it is currently usable
//! - optional ordering preferences against its peers
//! - a disposal callback
//!
//! Category traits extend [`Candidate`]:
//!
//! ```rust,ignore
//! trait Greeter: Candidate {
//!     fn greet(&self, name: &str) -> String;
//! }
//!
//! struct English;
//! impl Candidate for English {}
//! impl Greeter for English {
//!     fn greet(&self, name: &str) -> String { format!("Hello {name}") }
//! }
//! ```

use crate::{
    error::Unavailable,
    hints::{HintSet, HintValue},
    ordering::Organizer,
    types::{Category, ImplType},
};
use std::{
    any::Any,
    collections::HashSet,
    fmt::{self, Write as _},
    sync::Arc,
};

/// Result of a candidate's availability check.
#[derive(Debug, Clone, Default)]
pub enum Availability {
    /// The candidate can be used.
    #[default]
    Available,
    /// The candidate cannot be used right now.
    Unavailable(Unavailable),
}

impl Availability {
    /// Returns `true` for [`Availability::Available`].
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// Object-safe plumbing implemented for every sized [`Candidate`].
///
/// This lets the registry turn an `Arc<dyn MyCategory>` into the type-erased
/// `Arc<dyn Candidate>` view and read the concrete implementation type.
pub trait AsCandidate {
    /// The same instance, viewed as a candidate.
    fn as_candidate(self: Arc<Self>) -> Arc<dyn Candidate>;

    /// The instance as `Any`, for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// The concrete implementation type.
    fn implementation_type(&self) -> ImplType;
}

impl<C: Candidate> AsCandidate for C {
    fn as_candidate(self: Arc<Self>) -> Arc<dyn Candidate> {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn implementation_type(&self) -> ImplType {
        ImplType::of::<C>()
    }
}

/// A registered implementation for one or more categories.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a registry `Candidate`",
    label = "missing `Candidate` implementation",
    note = "Add `impl Candidate for {Self} {}` (all methods have defaults) or derive it."
)]
pub trait Candidate: AsCandidate + Send + Sync + 'static {
    /// The hints this instance was built with.
    ///
    /// Only used to compare against caller hints, never to construct anything.
    /// A value that is itself a [`Service`] declares a dependency; its own
    /// hints take part in the compatibility check.
    fn implementation_hints(&self) -> HintSet {
        HintSet::empty()
    }

    /// Whether this candidate can currently be used.
    fn availability(&self) -> Availability {
        Availability::Available
    }

    /// Declare ordering preferences against already registered peers.
    ///
    /// Called once, right after the candidate is registered for a category.
    fn declare_ordering(&self, organizer: &mut Organizer<'_>) {
        let _ = organizer;
    }

    /// Release resources. `shutdown` is `true` when the whole registry shuts down.
    fn dispose(&self, shutdown: bool) {
        let _ = shutdown;
    }

    /// The vendor of this implementation, used by vendor orderings.
    fn vendor(&self) -> Option<&str> {
        None
    }
}

/// Address of a candidate, used for identity comparisons.
pub fn address(candidate: &dyn Candidate) -> usize {
    candidate as *const dyn Candidate as *const () as usize
}

/// A candidate bound to the category it serves.
///
/// Keeps both the type-erased candidate view and the typed `Arc<T>` so the
/// registry can hand the instance back as `Arc<T>`.
#[derive(Clone)]
pub struct Service {
    category: Category,
    candidate: Arc<dyn Candidate>,
    facet: Arc<dyn Any + Send + Sync>,
}

impl Service {
    /// Bind `instance` to `Category::of::<T>()`.
    pub fn new<T: ?Sized + Candidate>(instance: Arc<T>) -> Self {
        Self {
            category: Category::of::<T>(),
            candidate: instance.clone().as_candidate(),
            facet: Arc::new(instance),
        }
    }

    /// The category this service was bound to.
    pub fn category(&self) -> Category {
        self.category
    }

    /// The type-erased candidate view.
    pub fn candidate(&self) -> &Arc<dyn Candidate> {
        &self.candidate
    }

    /// The concrete implementation type.
    pub fn implementation_type(&self) -> ImplType {
        self.candidate.implementation_type()
    }

    /// The instance as `Arc<T>`, if this service was bound as `T`.
    pub fn downcast<T: ?Sized + Candidate>(&self) -> Option<Arc<T>> {
        self.facet.downcast_ref::<Arc<T>>().cloned()
    }

    /// Address of the underlying instance.
    pub fn address(&self) -> usize {
        address(self.candidate.as_ref())
    }

    /// Whether both services wrap the same instance.
    pub fn same_instance(&self, other: &Service) -> bool {
        self.address() == other.address()
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as {}", self.implementation_type(), self.category)
    }
}

/// Render a candidate and its implementation hints as a tree.
///
/// Dependencies are expanded recursively; a dependency already on the current
/// path is printed once more and marked `(cycle)`.
///
/// ```text
/// PreciseCodec
/// ├─ precision = double
/// └─ delegate = FastCodec
///    └─ precision = single
/// ```
pub fn describe(candidate: &dyn Candidate) -> String {
    let mut out = String::new();
    let mut path = HashSet::new();
    let _ = writeln!(out, "{}", candidate.implementation_type());
    describe_hints(candidate, "", &mut path, &mut out);
    out
}

fn describe_hints(
    candidate: &dyn Candidate,
    indent: &str,
    path: &mut HashSet<usize>,
    out: &mut String,
) {
    path.insert(address(candidate));
    let hints = candidate.implementation_hints();
    let entries = hints.sorted();
    let count = entries.len();
    for (i, (key, value)) in entries.into_iter().enumerate() {
        let last = i + 1 == count;
        let branch = if last { "└─ " } else { "├─ " };
        match value {
            HintValue::Service(dependency) => {
                let dependency = dependency.candidate().as_ref();
                if path.contains(&address(dependency)) {
                    let _ = writeln!(
                        out,
                        "{indent}{branch}{key} = {} (cycle)",
                        dependency.implementation_type()
                    );
                } else {
                    let _ = writeln!(
                        out,
                        "{indent}{branch}{key} = {}",
                        dependency.implementation_type()
                    );
                    let nested = format!("{indent}{}", if last { "   " } else { "│  " });
                    describe_hints(dependency, &nested, path, out);
                }
            }
            other => {
                let _ = writeln!(out, "{indent}{branch}{key} = {other}");
            }
        }
    }
    path.remove(&address(candidate));
}
