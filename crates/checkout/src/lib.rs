//! Cart and checkout for the farm marketplace.
//!
//! The checkout turns every item in a buyer's cart into one pending order,
//! atomically:
//! 1. Lock and validate every product in cart order
//! 2. Place one order per item and decrement stock
//! 3. Clear the cart
//!
//! If any product fails validation in step 1, nothing is written and the
//! cart stays intact.

pub mod cart;
pub mod coordinator;

pub use cart::{AddToCart, CartLine, CartService};
pub use coordinator::{Checkout, CheckoutService};
