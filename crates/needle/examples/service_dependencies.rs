// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Declares the dependencies of a service, prints their inferred shape, then checks two
//! candidate dependencies objects against it.
//!
//! Run with debug logging to see the events the crate emits along the way.

use std::sync::LazyLock;

use needle::{Catalog, Dependencies, Injectable, Metadata, Multi, Optional, Token, TokenRef, multi, named, optional, tagged};

#[derive(Debug, Clone)]
struct Logger {
    sink: &'static str,
}

#[derive(Debug, Clone)]
struct Store;

static LOGGER: LazyLock<Token<Logger>> = LazyLock::new(|| Token::opaque(Some("Logger")));
static STORE: LazyLock<Token<Store>> = LazyLock::new(|| Token::string(Some("Store")));

needle::dependencies! {
    #[derive(Debug)]
    struct ServiceDependencies {
        audit: Metadata<Logger, Optional> = optional(named("audit").apply(LOGGER.clone())),
        sinks: Metadata<Logger, Multi> = multi(tagged("fan_out", true).apply(LOGGER.clone())),
        // The store token is created lazily, after this declaration is evaluated.
        store: TokenRef<Store> = Token::deferred(|| STORE.clone()),
        port: Token<u16> = Token::of_type(),
    }
}

fn main() -> Result<(), needle::Error> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let catalog = Catalog::new().register::<ServiceDependencies>();
    let shape = catalog.shape_of::<ServiceDependencies>()?;

    for (field, expected) in shape.iter() {
        println!("{field}: {} of {} (token {})", expected.kind(), expected.resolved(), expected.token());
    }

    for entry in ServiceDependencies::descriptors().field_metadata() {
        println!("{}: name = {:?}, tags = {:?}", entry.field, entry.name, entry.tags);
    }

    let provided = Dependencies::new()
        .with_many("sinks", [Logger { sink: "stdout" }, Logger { sink: "file" }])
        .with_one("store", Store)
        .with_one("port", 8080_u16);

    let dependencies = ServiceDependencies::try_from(&provided)?;
    let sinks: Vec<_> = dependencies.sinks.iter().map(|logger| logger.sink).collect();
    println!(
        "accepted: audit = {:?}, sinks = {sinks:?}, store = {:?}, port = {}",
        dependencies.audit, dependencies.store, dependencies.port
    );

    let wrong = provided.with_one("sinks", Logger { sink: "stdout" });
    match ServiceDependencies::try_from(&wrong) {
        Ok(_) => println!("unexpectedly accepted"),
        Err(error) => println!("rejected: {error}"),
    }

    Ok(())
}
