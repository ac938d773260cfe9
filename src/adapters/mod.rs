pub mod example_provider;
pub mod faker;
pub mod metrics_handler;
pub mod mock_middleware;
pub mod pattern;
pub mod resolver;
pub mod route_table;
pub mod script_provider;

#[cfg(test)]
mod example_provider_test;
#[cfg(test)]
mod mock_middleware_test;
