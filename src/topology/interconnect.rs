//! Links between independently resolved live endpoints.

use crate::runtime::{Runtime, RuntimeError};
use crate::utils::options::Attrs;

/// Connect two live nodes, typically owned by different domains of the same
/// runtime. A plain pass-through to the runtime's link creation; domain-local
/// links go through [`Domain::add_link`](crate::domain::Declarer::add_link)
/// instead.
pub fn connect<R: Runtime>(runtime: &mut R, a: &R::Node, b: &R::Node, attrs: &Attrs) -> Result<R::Link, RuntimeError> {
    runtime.add_link(a, b, attrs)
}
