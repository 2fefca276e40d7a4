mod aggregate;
mod executor;
mod flags;
