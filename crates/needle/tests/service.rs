// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Declaring, inferring and validating the dependencies of a service.

use core::fmt::Debug;
use std::sync::{Arc, LazyLock};

use needle::{
    Catalog, Dependencies, DescriptorMap, Error, Injectable, Kind, Kinded, Metadata, Multi, Optional, ShapeKind, Single, Token,
    TokenRef, multi, named, optional, tagged,
};

trait Logger: Debug + Send + Sync {
    fn name(&self) -> &str;
}

#[derive(Debug)]
struct ConsoleLogger(&'static str);

impl Logger for ConsoleLogger {
    fn name(&self) -> &str {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Plain(u32);

#[derive(Debug, Clone, PartialEq)]
struct Store {
    capacity: usize,
}

type SharedLogger = Arc<dyn Logger>;

static LOGGER: LazyLock<Token<SharedLogger>> = LazyLock::new(|| Token::opaque(Some("Logger")));
static STORE: LazyLock<Token<Store>> = LazyLock::new(|| Token::string(Some("Store")));
static MAP: LazyLock<Token<Vec<(String, u32)>>> = LazyLock::new(|| Token::opaque(Some("Map")));

needle::dependencies! {
    #[derive(Debug)]
    struct MyServiceDependencies {
        logger: Metadata<SharedLogger, Optional> = optional(LOGGER.clone()),
        loggers: Metadata<SharedLogger, Multi> = multi(LOGGER.clone()),
        plain: Token<Plain> = Token::of_type(),
        store: TokenRef<Store> = Token::deferred(|| STORE.clone()),
        arraybuffer: Metadata<Vec<u8>, Single> = tagged("x", 1).apply(Token::<Vec<u8>>::of_type()),
        map: Metadata<Vec<(String, u32)>, Single> = named("y").apply(Token::deferred(|| MAP.clone())),
    }
}

fn console(name: &'static str) -> SharedLogger {
    Arc::new(ConsoleLogger(name))
}

fn provided() -> Dependencies {
    Dependencies::new()
        .with_one("logger", console("main"))
        .with_many("loggers", [console("file"), console("stderr")])
        .with_one("plain", Plain(7))
        .with_one("store", Store { capacity: 16 })
        .with_one("arraybuffer", vec![1_u8, 2, 3])
        .with_one("map", vec![(String::from("k"), 1_u32)])
}

#[test]
fn shape_of_the_service() {
    let shape = MyServiceDependencies::shape().expect("no conflicting flags");

    let kinds: Vec<_> = shape.iter().map(|(field, shape)| (field.as_str(), shape.kind())).collect();
    assert_eq!(
        kinds,
        [
            ("arraybuffer", ShapeKind::Single),
            ("logger", ShapeKind::Optional),
            ("loggers", ShapeKind::Multi),
            ("map", ShapeKind::Single),
            ("plain", ShapeKind::Single),
            ("store", ShapeKind::Single),
        ]
    );

    assert_eq!(shape.get("store").map(|field| field.token()), Some(STORE.key()));
    assert_eq!(shape.get("map").map(|field| field.token()), Some(MAP.key()));
    assert!(shape.get("loggers").is_some_and(|field| field.resolved().is::<SharedLogger>()));
}

#[test]
fn descriptors_keep_their_decorations() {
    let descriptors = MyServiceDependencies::descriptors();

    let buffer = descriptors.get("arraybuffer").expect("declared");
    assert_eq!(buffer.kind(), Kind::Metadata);
    assert_eq!(buffer.tags().get("x"), Some(&1.into()));

    let map = descriptors.get("map").expect("declared");
    assert_eq!(map.name(), Some("y"));

    let store = descriptors.get("store").expect("declared");
    assert_eq!(store.kind(), Kind::ReferenceBox);

    let plain = descriptors.get("plain").expect("declared");
    assert_eq!(plain.kind(), Kind::PlainToken);
    assert!(plain.tags().is_empty());
}

#[test]
fn valid_dependencies_convert() {
    let dependencies = MyServiceDependencies::try_from(&provided()).expect("dependencies are valid");

    assert_eq!(dependencies.logger.as_ref().map(|logger| logger.name()), Some("main"));
    assert_eq!(
        dependencies.loggers.iter().map(|logger| logger.name()).collect::<Vec<_>>(),
        ["file", "stderr"]
    );
    assert_eq!(dependencies.plain, Plain(7));
    assert_eq!(dependencies.store, Store { capacity: 16 });
    assert_eq!(dependencies.arraybuffer, [1, 2, 3]);
    assert_eq!(dependencies.map, [(String::from("k"), 1)]);
}

#[test]
fn optional_logger_may_be_absent() {
    let dependencies = MyServiceDependencies::try_from(&provided().with_optional::<SharedLogger>("logger", None))
        .expect("the logger is optional");

    assert!(dependencies.logger.is_none());
}

#[test]
fn bare_value_where_a_sequence_is_expected_is_rejected() {
    let invalid = provided().with_one("loggers", console("only"));

    let error = MyServiceDependencies::try_from(&invalid).expect_err("a sequence is required");
    assert_eq!(
        error,
        Error::CardinalityMismatch {
            field: "loggers".into(),
            expected: ShapeKind::Multi,
            found: ShapeKind::Single,
        }
    );
}

#[test]
fn missing_plain_dependency_is_rejected() {
    let invalid = provided().with_optional::<Plain>("plain", None);

    assert_eq!(
        MyServiceDependencies::try_from(&invalid).map(drop),
        Err(Error::MissingField { field: "plain".into() })
    );
}

#[test]
fn catalog_serves_the_declared_shape() {
    let catalog = Catalog::new().register::<MyServiceDependencies>();

    assert_eq!(catalog.shape_of::<MyServiceDependencies>(), MyServiceDependencies::shape());
    assert!(matches!(
        catalog.descriptors_of::<Store>(),
        Err(Error::MissingAnnotation { .. })
    ));
}

#[test]
fn field_metadata_for_an_external_container() {
    let snapshot = MyServiceDependencies::descriptors().field_metadata();
    let loggers = snapshot.iter().find(|entry| entry.field == "loggers").expect("declared");

    assert_eq!(&loggers.token, LOGGER.key());
    assert_eq!(loggers.shape, ShapeKind::Multi);
    assert_eq!(loggers.name, None);
}

#[test]
fn hand_written_descriptor_maps_match_the_macro() {
    let by_hand = DescriptorMap::new()
        .with("logger", optional(LOGGER.clone()))
        .with("loggers", multi(LOGGER.clone()))
        .with("plain", Token::<Plain>::of_type())
        .with("store", Token::deferred(|| STORE.clone()))
        .with("arraybuffer", tagged("x", 1).apply(Token::<Vec<u8>>::of_type()))
        .with("map", named("y").apply(Token::deferred(|| MAP.clone())));

    assert_eq!(needle::infer_shape(&by_hand), MyServiceDependencies::shape());
}
