/*!
 * Synchronization Primitives
 *
 * Read-copy-update cell used to publish immutable generations of watchdog
 * state to any number of readers.
 */

mod rcu;

pub use rcu::RcuCell;
