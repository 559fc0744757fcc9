// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Mediator Sandbox
// Wires a small router/pages app through the mediator.
//
// Usage: sandbox [config.json]

use std::sync::Arc;

use anyhow::{Context, Result};
use mediator_core::{
    Bus, ErrorReport, ErrorTarget, EventBus, Mediator, MediatorConfig, Module, ModuleBase,
    ModuleOptions, ModuleRef, Payload,
};
use mediator_telemetry::error_mediator::ERROR_EVENT;
use mediator_telemetry::{init_logging, ErrorMediator};
use serde_json::json;

struct Router {
    base: ModuleBase,
}

impl Router {
    fn new(options: Option<ModuleOptions>) -> Self {
        let defaults = ModuleOptions::new()
            .with_id("Router")
            .with("base", json!("/"));
        Self {
            base: ModuleBase::new(defaults, options),
        }
    }

    fn base_path(&self) -> &str {
        self.base
            .get_options()
            .get("base")
            .and_then(|value| value.as_str())
            .unwrap_or("/")
    }
}

impl Module for Router {
    fn options(&self) -> Option<&ModuleOptions> {
        Some(self.base.get_options())
    }
}

struct Pages {
    base: ModuleBase,
}

impl Pages {
    fn new() -> Self {
        let defaults = ModuleOptions::new()
            .with_name("Pages")
            .with("pages", json!(["home", "about"]));
        Self {
            base: ModuleBase::new(defaults, None),
        }
    }

    fn count(&self) -> usize {
        self.base
            .get_options()
            .get("pages")
            .and_then(|value| value.as_array())
            .map_or(0, Vec::len)
    }
}

impl Module for Pages {
    fn options(&self) -> Option<&ModuleOptions> {
        Some(self.base.get_options())
    }
}

fn load_config() -> Result<MediatorConfig> {
    match std::env::args().nth(1) {
        Some(path) => MediatorConfig::load(&path)
            .with_context(|| format!("failed to load mediator config from '{path}'")),
        None => Ok(MediatorConfig::default()),
    }
}

fn main() -> Result<()> {
    init_logging().context("failed to initialize logging")?;

    let config = load_config()?;
    let bus = Arc::new(EventBus::new());
    let mediator = Mediator::with_config(bus.clone(), config);
    let errors = ErrorMediator::attach(bus.clone());

    mediator.ready(&["Router", "Pages"], |instances| {
        let router = instances[0].downcast_ref::<Router>();
        let pages = instances[1].downcast_ref::<Pages>();
        if let (Some(router), Some(pages)) = (router, pages) {
            log::info!(
                "Sandbox: router at '{}' serving {} pages.",
                router.base_path(),
                pages.count()
            );
        }
    });

    let navigation = mediator.on("navigate", &["Router"], |payload, instances| {
        let target = payload
            .as_value()
            .and_then(|value| value.as_str())
            .unwrap_or("?");
        if let Some(router) = instances[0].downcast_ref::<Router>() {
            log::info!("Sandbox: navigating to '{}{}'.", router.base_path(), target);
        }
    });

    // Fired before the router exists: queued until it registers.
    bus.emit("navigate", Payload::Value(json!("about")));
    log::info!("Sandbox: {} navigation(s) queued.", navigation.queued());

    mediator.announce(ModuleRef::new(Pages::new()));
    mediator.announce(ModuleRef::new(Router::new(Some(
        ModuleOptions::new().with("base", json!("/app/")),
    ))));

    bus.emit("navigate", Payload::Value(json!("home")));

    if let Some(router) = mediator.get::<Router>("Router") {
        bus.emit(
            ERROR_EVENT,
            Payload::Error(
                ErrorReport::new(
                    ErrorTarget::Module(ModuleRef::from(router)),
                    "no route for 'contact'",
                )
                .with_data(json!({ "path": "/app/contact" })),
            ),
        );
    }

    mediator.ready(&["Analytics"], |_| {
        log::info!("Sandbox: analytics loaded.");
    });

    let pending = mediator.report_pending();
    log::info!(
        "Sandbox: {} module(s) registered, {} waiter(s) pending, {} error(s) reported.",
        mediator.names().len(),
        pending,
        errors.reported()
    );

    navigation.cancel();
    errors.detach();
    mediator.detach();
    Ok(())
}
