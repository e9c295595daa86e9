//! # Parambind Core
//!
//! Transport-independent building blocks for declaring HTTP endpoints by
//! their parameters.
//!
//! A handler declares what it needs as a list of [`Param`]s. For every
//! request the core:
//!
//! 1. matches the path against a [`RouteTable`] of [`RoutePattern`]s
//! 2. reads each parameter from its [`Source`] (path, query, header, cookie, body)
//! 3. coerces and validates the raw values against their [`Shape`]
//! 4. hands the handler a [`Bound`] set of values, or a [`ValidationError`]
//!    carrying every [`Finding`] at once
//!
//! On the way out, a [`ResponseModel`] re-shapes the handler's output and
//! applies field filters.
//!
//! ## Example
//!
//! ```
//! use http::Method;
//! use parambind_core::{BindPlan, Param, RawRequest, RoutePattern, Shape};
//!
//! let pattern = RoutePattern::parse("/items/{item_id}").unwrap();
//! let plan = BindPlan::new(
//!     &pattern,
//!     vec![
//!         Param::new("item_id", Shape::int()),
//!         Param::new("q", Shape::str()).optional(),
//!     ],
//! )
//! .unwrap();
//!
//! let request = RawRequest::new(Method::GET, "/items/5?q=somequery");
//! let captures = pattern.matches(request.path()).unwrap();
//! let bound = plan.bind(&captures, &request).unwrap();
//! assert_eq!(bound.get::<i64>("item_id").unwrap(), 5);
//! assert_eq!(bound.get::<Option<String>>("q").unwrap().as_deref(), Some("somequery"));
//! ```

pub mod binder;
pub mod coerce;
pub mod error;
pub mod finding;
pub mod param;
pub mod request;
pub mod response;
pub mod route;
pub mod shape;

pub use binder::{BindPlan, Bound};
pub use error::{BoundError, DispatchError, RouteError, ShapeError};
pub use finding::{ErrorKind, Finding, Loc, LocPart, ValidationError};
pub use param::{Param, Source};
pub use request::RawRequest;
pub use response::ResponseModel;
pub use route::{Captures, Lookup, RoutePattern, RouteTable, Segment};
pub use shape::{EnumShape, FieldSpec, ModelSchema, Presence, Shape};
