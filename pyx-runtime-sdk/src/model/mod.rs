pub mod message;
pub mod path;
pub mod value;

#[cfg(test)]
mod tests;
