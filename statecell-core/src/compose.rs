//! Right-to-left function composition
//!
//! Used to build the middleware chain and to stack store enhancers.

use std::rc::Rc;

/// A shared unary function from `T` to `T`
pub type Unary<T> = Rc<dyn Fn(T) -> T>;

/// Compose unary functions from right to left.
///
/// `compose(vec![f, g, h])(x)` is `f(g(h(x)))`. With no functions the result is
/// the identity; with exactly one function that same `Rc` is handed back.
///
/// # Example
/// ```
/// use std::rc::Rc;
/// use statecell_core::compose::{compose, Unary};
///
/// let add_one: Unary<i32> = Rc::new(|x: i32| x + 1);
/// let double: Unary<i32> = Rc::new(|x: i32| x * 2);
/// let f = compose(vec![add_one, double]);
/// assert_eq!(f(5), 11);
/// ```
pub fn compose<T: 'static>(mut fns: Vec<Unary<T>>) -> Unary<T> {
    match fns.len() {
        0 => Rc::new(|x: T| x),
        1 => fns.remove(0),
        _ => Rc::new(move |x: T| fns.iter().rev().fold(x, |acc, f| f(acc))),
    }
}

/// Compose closures of differing types from right to left.
///
/// The rightmost expression receives the argument; each other one receives the
/// return value of its right neighbour. `compose!()` is the identity.
///
/// ```
/// use statecell_core::compose;
///
/// let f = compose!(|s: String| s.len(), |n: i32| n.to_string());
/// assert_eq!(f(1234), 4);
/// ```
#[macro_export]
macro_rules! compose {
    () => {
        |x| x
    };
    ($f:expr $(,)?) => {
        $f
    };
    ($f:expr, $($rest:expr),+ $(,)?) => {{
        let outer = $f;
        let inner = $crate::compose!($($rest),+);
        move |x| outer(inner(x))
    }};
}
