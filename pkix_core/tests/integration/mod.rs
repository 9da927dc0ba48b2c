mod chain;
mod fetch;
mod logging;
