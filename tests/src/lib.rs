//! End-to-end discovery scenarios against a scripted lab network.

#[cfg(test)]
mod discovery;
#[cfg(test)]
mod utils;
