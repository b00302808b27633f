//! End-to-end tests for the DSL parser.
//!
//! These drive complete sources through [`Parser::parse_str`] and inspect
//! the workspace that comes out, covering element and relationship
//! statements, archetypes, deployment, views, styles, directives and the
//! extension points.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use indexmap::IndexMap;
use maquette_core::Workspace;
use maquette_core::model::{Element, ElementId, ElementKind, Model};

use crate::error::{ErrorCode, ParserError, Result};
use crate::plugins::{ComponentFinder, DslPlugin, ExtensionBindings, ExtensionError, ScriptEngine};
use crate::remote::{FetchedContent, UrlFetcher};
use crate::{Feature, Parser};

fn parse(source: &str) -> Workspace {
    let mut parser = Parser::new();
    parser.parse_str(source).expect("source should parse");
    parser
        .into_workspace()
        .expect("source should define a workspace")
}

fn parse_err(source: &str) -> ParserError {
    let mut parser = Parser::new();
    parser
        .parse_str(source)
        .expect_err("source should fail to parse")
}

/// Finds an element anywhere in the model by name.
fn element_named<'a>(model: &'a Model, name: &str) -> &'a Element {
    model
        .elements()
        .find(|element| element.name() == name)
        .unwrap_or_else(|| panic!("element \"{name}\" should exist"))
}

/// A fetcher serving canned responses, so tests never touch the network.
#[derive(Debug, Default)]
struct CannedFetcher {
    responses: HashMap<String, String>,
}

impl CannedFetcher {
    fn with(url: &str, content: &str) -> Self {
        let mut fetcher = Self::default();
        fetcher
            .responses
            .insert(url.to_owned(), content.to_owned());
        fetcher
    }
}

impl UrlFetcher for CannedFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedContent> {
        self.responses
            .get(url)
            .map(|content| FetchedContent {
                content: content.clone(),
                content_type: None,
            })
            .ok_or_else(|| ParserError::new(ErrorCode::E601, format!("no response for {url}")))
    }
}

/// A script engine that records every run it receives.
#[derive(Debug)]
struct RecordingEngine {
    runs: Rc<RefCell<Vec<(String, usize, bool)>>>,
}

impl ScriptEngine for RecordingEngine {
    fn run(
        &self,
        source: &str,
        parameters: &IndexMap<String, String>,
        bindings: &mut ExtensionBindings<'_>,
    ) -> std::result::Result<(), ExtensionError> {
        self.runs.borrow_mut().push((
            source.trim().to_owned(),
            parameters.len(),
            bindings.element.is_some(),
        ));
        Ok(())
    }
}

/// A plugin that renames the workspace to its `name` parameter.
#[derive(Debug)]
struct RenamePlugin;

impl DslPlugin for RenamePlugin {
    fn run(
        &self,
        parameters: &IndexMap<String, String>,
        bindings: &mut ExtensionBindings<'_>,
    ) -> std::result::Result<(), ExtensionError> {
        if let Some(name) = parameters.get("name") {
            bindings.workspace.set_name(name);
        }
        Ok(())
    }
}

/// A component finder that creates one component per `component` directive.
#[derive(Debug)]
struct DirectiveFinder;

impl ComponentFinder for DirectiveFinder {
    fn run(
        &self,
        workspace: &mut Workspace,
        container: ElementId,
        directives: &[(String, Vec<String>)],
    ) -> std::result::Result<Vec<ElementId>, ExtensionError> {
        let mut created = Vec::new();
        for (keyword, arguments) in directives {
            if keyword == "component" {
                if let Some(name) = arguments.first() {
                    created.push(workspace.model_mut().add_component(container, name, "", "")?);
                }
            }
        }
        Ok(created)
    }
}

mod workspace_tests {
    use super::*;

    #[test]
    fn parses_name_and_description() {
        let workspace = parse("workspace \"Shop\" \"An online shop\" {\n}\n");
        assert_eq!(workspace.name(), "Shop");
        assert_eq!(workspace.description(), "An online shop");
    }

    #[test]
    fn name_and_description_statements_override_the_header() {
        let workspace = parse(
            r#"
            workspace {
                name "Shop"
                description "An online shop"
            }
            "#,
        );
        assert_eq!(workspace.name(), "Shop");
        assert_eq!(workspace.description(), "An online shop");
    }

    #[test]
    fn rejects_a_second_model_block() {
        let err = parse_err(
            r#"
            workspace {
                model {
                }
                model {
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E502);
    }

    #[test]
    fn parses_configuration_and_properties() {
        let workspace = parse(
            r#"
            workspace {
                properties {
                    owner "platform-team"
                }
                configuration {
                    scope softwareSystem
                    visibility private
                }
            }
            "#,
        );
        assert_eq!(workspace.property("owner"), Some("platform-team"));
        assert!(workspace.configuration().scope().is_some());
        assert!(workspace.configuration().visibility().is_some());
    }

    #[test]
    fn unexpected_statements_list_the_permitted_tokens() {
        let err = parse_err(
            r#"
            workspace {
                model {
                    widget "Nope"
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E300);
        let help = err.help().expect("context errors should carry help");
        assert!(help.contains("person"));
        assert!(help.contains("softwareSystem"));
    }

    #[test]
    fn statements_outside_a_workspace_are_rejected() {
        let err = parse_err("model { }");
        assert_eq!(err.code(), ErrorCode::E300);
        assert_eq!(err.help(), Some("expected: workspace"));
    }

    #[test]
    fn embeds_the_source_under_the_dsl_property() {
        let source = "workspace \"Shop\" {\n}\n";
        let workspace = parse(source);
        let encoded = workspace
            .property("maquette.dsl")
            .expect("the source should be embedded");
        let decoded = STANDARD.decode(encoded).expect("embedded source is base64");
        assert_eq!(String::from_utf8(decoded).unwrap(), source);
    }

    #[test]
    fn source_embedding_can_be_opted_out() {
        let workspace = parse(
            r#"
            workspace {
                properties {
                    maquette.dsl.source "false"
                }
            }
            "#,
        );
        assert_eq!(workspace.property("maquette.dsl"), None);
    }

    #[test]
    fn errors_carry_the_offending_line() {
        let err = parse_err("workspace {\n    nonsense here\n}\n");
        let location = err.location().expect("errors should carry a location");
        assert_eq!(location.file(), "<inline>");
        assert_eq!(location.line_number(), 2);
        assert!(location.line_text().contains("nonsense"));
    }
}

mod model_tests {
    use super::*;

    #[test]
    fn builds_two_systems_and_a_relationship() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    a = softwareSystem "A"
                    b = softwareSystem "B"
                    a -> b "Uses"
                }
            }
            "#,
        );
        let model = workspace.model();
        assert_eq!(model.elements().count(), 2);
        assert!(model.find_element_by_name(None, "A").is_some());
        assert!(model.find_element_by_name(None, "B").is_some());

        let relationships: Vec<_> = model.relationships().collect();
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].description(), "Uses");
    }

    #[test]
    fn element_blocks_set_attributes() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    person "Customer" {
                        description "A paying customer"
                        tags "External, VIP"
                        url "https://example.com/customers"
                        properties {
                            region "EU"
                        }
                        perspectives {
                            Security "Authenticated via SSO"
                        }
                    }
                }
            }
            "#,
        );
        let customer = element_named(workspace.model(), "Customer");
        assert_eq!(customer.description(), "A paying customer");
        assert!(customer.has_tag("External"));
        assert!(customer.has_tag("VIP"));
        assert_eq!(customer.url(), "https://example.com/customers");
        assert_eq!(customer.property("region"), Some("EU"));
        assert!(customer.perspectives().contains_key("Security"));
    }

    #[test]
    fn nests_containers_and_components() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    shop = softwareSystem "Shop" {
                        api = container "API" "The backend" "Rust" {
                            component "Orders" "Order handling"
                            technology "Rust 1.86"
                        }
                    }
                }
            }
            "#,
        );
        let model = workspace.model();
        let api = element_named(model, "API");
        assert_eq!(api.technology(), "Rust 1.86");
        let orders = element_named(model, "Orders");
        assert_eq!(orders.parent(), Some(api.id()));
        assert_eq!(orders.description(), "Order handling");
    }

    #[test]
    fn custom_elements_carry_metadata() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    element "Mainframe" "legacy" "The old core"
                }
            }
            "#,
        );
        let mainframe = element_named(workspace.model(), "Mainframe");
        assert!(matches!(
            mainframe.kind(),
            ElementKind::CustomElement { metadata } if metadata == "legacy"
        ));
        assert_eq!(mainframe.description(), "The old core");
    }

    #[test]
    fn groups_track_membership() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    group "Internal" {
                        softwareSystem "A"
                    }
                    softwareSystem "B"
                }
            }
            "#,
        );
        let model = workspace.model();
        let group = element_named(model, "Internal").id();
        let a = model.find_element_by_name(None, "A").unwrap();
        let b = model.find_element_by_name(None, "B").unwrap();
        assert!(model.in_group(a, group));
        assert!(!model.in_group(b, group));
    }

    #[test]
    fn nested_groups_need_the_separator_property() {
        let err = parse_err(
            r#"
            workspace {
                model {
                    group "Outer" {
                        group "Inner" {
                        }
                    }
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E504);
    }

    #[test]
    fn nested_group_names_join_with_the_separator() {
        let workspace = parse(
            r#"
            workspace {
                properties {
                    maquette.groupSeparator "/"
                }
                model {
                    group "Outer" {
                        group "Inner" {
                            softwareSystem "A"
                        }
                    }
                }
            }
            "#,
        );
        let model = workspace.model();
        let inner = element_named(model, "Outer/Inner").id();
        let a = model.find_element_by_name(None, "A").unwrap();
        assert!(model.in_group(a, inner));
    }

    #[test]
    fn duplicate_relationships_are_rejected() {
        let err = parse_err(
            r#"
            workspace {
                model {
                    a = softwareSystem "A"
                    b = softwareSystem "B"
                    a -> b "Uses"
                    a -> b "Uses"
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E506);
        assert!(err.message().contains("already exists"));
    }

    #[test]
    fn differently_described_relationships_coexist() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    a = softwareSystem "A"
                    b = softwareSystem "B"
                    a -> b "Reads"
                    a -> b "Writes"
                }
            }
            "#,
        );
        assert_eq!(workspace.model().relationships().count(), 2);
    }

    #[test]
    fn this_names_the_enclosing_element() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    b = softwareSystem "B"
                    softwareSystem "A" {
                        this -> b "Calls"
                    }
                }
            }
            "#,
        );
        let model = workspace.model();
        let a = model.find_element_by_name(None, "A").unwrap();
        let relationship = model.relationships().next().unwrap();
        assert_eq!(relationship.source(), a);
    }

    #[test]
    fn relationship_blocks_set_attributes() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    a = softwareSystem "A"
                    b = softwareSystem "B"
                    a -> b "Uses" "HTTPS" "Sync" {
                        tags "Critical"
                        url "https://example.com/contract"
                    }
                }
            }
            "#,
        );
        let relationship = workspace.model().relationships().next().unwrap();
        assert_eq!(relationship.technology(), "HTTPS");
        assert!(relationship.has_tag("Sync"));
        assert!(relationship.has_tag("Critical"));
        assert_eq!(relationship.url(), "https://example.com/contract");
    }

    #[test]
    fn implied_relationships_reach_the_parent() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    customer = person "Customer"
                    shop = softwareSystem "Shop" {
                        web = container "Web"
                    }
                    customer -> web "Uses"
                }
            }
            "#,
        );
        let model = workspace.model();
        let customer = model.find_element_by_name(None, "Customer").unwrap();
        let shop = model.find_element_by_name(None, "Shop").unwrap();
        assert!(
            model
                .relationships()
                .any(|r| r.source() == customer && r.destination() == shop),
            "an implied customer -> shop relationship should exist"
        );
    }

    #[test]
    fn implied_relationships_can_be_switched_off() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    !impliedRelationships false
                    customer = person "Customer"
                    shop = softwareSystem "Shop" {
                        web = container "Web"
                    }
                    customer -> web "Uses"
                }
            }
            "#,
        );
        assert_eq!(workspace.model().relationships().count(), 1);
    }

    #[test]
    fn removal_arrow_deletes_matching_relationships() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    a = softwareSystem "A"
                    b = softwareSystem "B"
                    a -> b "Reads"
                    a -> b "Writes"
                    a -/> b "Reads"
                }
            }
            "#,
        );
        let relationships: Vec<_> = workspace.model().relationships().collect();
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].description(), "Writes");
    }

    #[test]
    fn removal_arrow_with_no_match_is_an_error() {
        let err = parse_err(
            r#"
            workspace {
                model {
                    a = softwareSystem "A"
                    b = softwareSystem "B"
                    a -/> b
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E201);
    }

    #[test]
    fn unknown_endpoints_are_reported() {
        let err = parse_err(
            r#"
            workspace {
                model {
                    a = softwareSystem "A"
                    a -> ghost "Haunts"
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E200);
        assert!(err.message().contains("ghost"));
    }
}

mod identifier_tests {
    use super::*;

    #[test]
    fn flat_scope_rejects_duplicate_identifiers() {
        let err = parse_err(
            r#"
            workspace {
                model {
                    db = softwareSystem "A"
                    db = softwareSystem "B"
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E505);
    }

    #[test]
    fn hierarchical_scope_qualifies_by_the_enclosing_element() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    !identifiers hierarchical
                    a = softwareSystem "A" {
                        db = container "A Database"
                    }
                    b = softwareSystem "B" {
                        db = container "B Database"
                        web = container "B Web" {
                            this -> db "Queries"
                        }
                    }
                }
            }
            "#,
        );
        let model = workspace.model();
        let b_db = element_named(model, "B Database").id();
        let relationship = workspace.model().relationships().next().unwrap();
        assert_eq!(relationship.destination(), b_db);
    }

    #[test]
    fn invalid_identifiers_are_rejected() {
        let err = parse_err(
            r#"
            workspace {
                model {
                    bad!id = softwareSystem "A"
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E102);
    }

    #[test]
    fn assignments_are_only_legal_on_nameable_statements() {
        let err = parse_err(
            r#"
            workspace {
                x = name "Shop"
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E301);
    }
}

mod archetype_tests {
    use super::*;

    #[test]
    fn archetypes_supply_defaults_and_union_tags() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    archetypes {
                        queue = container {
                            technology "Kafka"
                            tags "Queue, Async"
                        }
                    }
                    shop = softwareSystem "Shop" {
                        orders = queue "Orders" "Order stream" "" "Critical"
                    }
                }
            }
            "#,
        );
        let orders = element_named(workspace.model(), "Orders");
        assert!(matches!(orders.kind(), ElementKind::Container));
        assert_eq!(orders.description(), "Order stream");
        assert_eq!(orders.technology(), "");
        assert!(orders.has_tag("Queue"));
        assert!(orders.has_tag("Async"));
        assert!(orders.has_tag("Critical"));
    }

    #[test]
    fn explicit_tokens_win_over_archetype_defaults() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    archetypes {
                        queue = container {
                            description "A queue"
                            technology "Kafka"
                        }
                    }
                    shop = softwareSystem "Shop" {
                        a = queue "A"
                        b = queue "B" "Custom" "RabbitMQ"
                    }
                }
            }
            "#,
        );
        let model = workspace.model();
        let a = element_named(model, "A");
        assert_eq!(a.description(), "A queue");
        assert_eq!(a.technology(), "Kafka");
        let b = element_named(model, "B");
        assert_eq!(b.description(), "Custom");
        assert_eq!(b.technology(), "RabbitMQ");
    }

    #[test]
    fn archetypes_copy_from_other_archetypes() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    archetypes {
                        queue = container {
                            technology "Kafka"
                        }
                        topic = queue
                    }
                    shop = softwareSystem "Shop" {
                        t = topic "Events"
                    }
                }
            }
            "#,
        );
        assert_eq!(element_named(workspace.model(), "Events").technology(), "Kafka");
    }

    #[test]
    fn unknown_archetype_bases_are_rejected() {
        let err = parse_err(
            r#"
            workspace {
                model {
                    archetypes {
                        queue = conveyor
                    }
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E204);
    }
}

mod deployment_tests {
    use super::*;

    #[test]
    fn builds_environments_nodes_and_infrastructure() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    deploymentEnvironment "Production" {
                        deploymentNode "AWS" "" "Amazon Web Services" {
                            deploymentNode "EC2" "" "" "" 4 {
                                infrastructureNode "Load Balancer" "" "ELB"
                            }
                        }
                    }
                }
            }
            "#,
        );
        let model = workspace.model();
        let ec2 = element_named(model, "EC2");
        assert!(matches!(
            ec2.kind(),
            ElementKind::DeploymentNode { instances } if instances == "4"
        ));
        let balancer = element_named(model, "Load Balancer");
        assert_eq!(balancer.technology(), "ELB");
        assert_eq!(balancer.parent(), Some(ec2.id()));
    }

    #[test]
    fn instances_replicate_static_relationships() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    a = softwareSystem "A"
                    b = softwareSystem "B"
                    a -> b "Calls"
                    production = deploymentEnvironment "Production" {
                        deploymentNode "Server" {
                            softwareSystemInstance a
                            softwareSystemInstance b
                        }
                    }
                }
            }
            "#,
        );
        let model = workspace.model();
        let a = model.find_element_by_name(None, "A").unwrap();
        let environment = element_named(model, "Production").id();
        let instances = model.instances_of(a, environment);
        assert_eq!(instances.len(), 1);

        let replicated = model
            .relationships()
            .filter(|r| model.element(r.source()).kind().is_instance())
            .count();
        assert_eq!(replicated, 1);
    }

    #[test]
    fn disjoint_deployment_groups_suppress_replication() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    shop = softwareSystem "Shop" {
                        web = container "Web"
                        db = container "Database"
                        web -> db "Queries"
                    }
                    deploymentEnvironment "Production" {
                        deploymentNode "Server" {
                            containerInstance web "Group 1"
                            containerInstance db "Group 2"
                        }
                    }
                }
            }
            "#,
        );
        let model = workspace.model();
        let replicated = model
            .relationships()
            .filter(|r| model.element(r.source()).kind().is_instance())
            .count();
        assert_eq!(replicated, 0);
    }

    #[test]
    fn removal_inside_an_environment_targets_the_instances() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    a = softwareSystem "A"
                    b = softwareSystem "B"
                    a -> b "Calls"
                    deploymentEnvironment "Production" {
                        deploymentNode "Server" {
                            softwareSystemInstance a
                            softwareSystemInstance b
                        }
                        a -/> b
                    }
                }
            }
            "#,
        );
        let model = workspace.model();
        let instance_relationships = model
            .relationships()
            .filter(|r| model.element(r.source()).kind().is_instance())
            .count();
        assert_eq!(instance_relationships, 0);
        // The static relationship is untouched.
        assert_eq!(model.relationships().count(), 1);
    }

    #[test]
    fn instance_tags_apply_to_the_instance() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    a = softwareSystem "A"
                    deploymentEnvironment "Production" {
                        deploymentNode "Server" {
                            softwareSystemInstance a "Default" "Blue"
                        }
                    }
                }
            }
            "#,
        );
        let model = workspace.model();
        let instance = model
            .elements()
            .find(|element| element.kind().is_instance())
            .unwrap();
        assert!(instance.has_tag("Blue"));
        assert_eq!(instance.deployment_groups(), ["Default"]);
    }
}

mod extend_tests {
    use super::*;

    const SOURCE: &str = r#"
        workspace "Shop" {
            model {
                a = softwareSystem "A"
                b = softwareSystem "B"
                a -> b "Uses"
            }
        }
    "#;

    #[test]
    fn reparsing_the_same_source_creates_no_duplicates() {
        let mut parser = Parser::new();
        parser.parse_str(SOURCE).unwrap();
        parser.parse_str(SOURCE).unwrap();
        let workspace = parser.into_workspace().unwrap();
        assert_eq!(workspace.model().elements().count(), 2);
        assert_eq!(workspace.model().relationships().count(), 1);
    }

    #[test]
    fn reasserting_statements_overwrite_attributes() {
        let mut parser = Parser::new();
        parser.parse_str(SOURCE).unwrap();
        parser
            .parse_str(
                r#"
                workspace {
                    model {
                        a = softwareSystem "A" "The source of truth"
                    }
                }
                "#,
            )
            .unwrap();
        let workspace = parser.into_workspace().unwrap();
        assert_eq!(workspace.model().elements().count(), 2);
        let a = element_named(workspace.model(), "A");
        assert_eq!(a.description(), "The source of truth");
    }

    #[test]
    fn extends_pulls_in_the_base_document() {
        let mut parser = Parser::new();
        parser.set_fetcher(Box::new(CannedFetcher::with(
            "https://example.com/base.dsl",
            SOURCE,
        )));
        parser
            .parse_str(
                r#"
                workspace extends https://example.com/base.dsl {
                    model {
                        a = softwareSystem "A"
                        c = softwareSystem "C"
                        a -> c "Publishes"
                    }
                }
                "#,
            )
            .unwrap();
        let workspace = parser.into_workspace().unwrap();
        assert_eq!(workspace.name(), "Shop");
        assert_eq!(workspace.model().elements().count(), 3);
        assert_eq!(workspace.model().relationships().count(), 2);
    }
}

mod directive_tests {
    use super::*;

    #[test]
    fn constants_substitute_and_refuse_redeclaration() {
        let workspace = parse(
            r#"
            !const prefix "Shop"
            workspace {
                model {
                    softwareSystem "${prefix} API"
                }
            }
            "#,
        );
        assert!(
            workspace
                .model()
                .find_element_by_name(None, "Shop API")
                .is_some()
        );

        let err = parse_err(
            r#"
            !const prefix "Shop"
            !const prefix "Store"
            workspace { }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E503);
    }

    #[test]
    fn variables_may_be_redeclared() {
        let workspace = parse(
            r#"
            !var prefix "Shop"
            !var prefix "Store"
            workspace {
                model {
                    softwareSystem "${prefix} API"
                }
            }
            "#,
        );
        assert!(
            workspace
                .model()
                .find_element_by_name(None, "Store API")
                .is_some()
        );
    }

    #[test]
    fn unknown_substitutions_stay_verbatim() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    softwareSystem "${mystery} API"
                }
            }
            "#,
        );
        assert!(
            workspace
                .model()
                .find_element_by_name(None, "${mystery} API")
                .is_some()
        );
    }

    #[test]
    fn url_includes_splice_content_and_stay_portable() {
        let mut parser = Parser::new();
        parser.set_fetcher(Box::new(CannedFetcher::with(
            "https://example.com/people.dsl",
            "person \"Customer\"",
        )));
        parser
            .parse_str(
                r#"
                workspace {
                    model {
                        !include https://example.com/people.dsl
                    }
                }
                "#,
            )
            .unwrap();
        assert!(parser.portable());
        let workspace = parser.into_workspace().unwrap();
        assert!(
            workspace
                .model()
                .find_element_by_name(None, "Customer")
                .is_some()
        );
    }

    #[test]
    fn file_includes_mark_the_workspace_as_not_portable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("people.dsl"), "person \"Customer\"\n").unwrap();
        std::fs::write(
            dir.path().join("workspace.dsl"),
            "workspace {\n    model {\n        !include people.dsl\n    }\n}\n",
        )
        .unwrap();

        let mut parser = Parser::new();
        parser.parse_file(dir.path().join("workspace.dsl")).unwrap();
        assert!(!parser.portable());
        let workspace = parser.into_workspace().unwrap();
        assert!(
            workspace
                .model()
                .find_element_by_name(None, "Customer")
                .is_some()
        );
        // Not portable, so no source embedding either.
        assert_eq!(workspace.property("maquette.dsl"), None);
    }

    #[test]
    fn directory_includes_expand_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let includes = dir.path().join("model");
        std::fs::create_dir(&includes).unwrap();
        std::fs::write(includes.join("b.dsl"), "softwareSystem \"B\"\n").unwrap();
        std::fs::write(includes.join("a.dsl"), "softwareSystem \"A\"\n").unwrap();
        std::fs::write(
            dir.path().join("workspace.dsl"),
            "workspace {\n    model {\n        !include model\n    }\n}\n",
        )
        .unwrap();

        let mut parser = Parser::new();
        parser.parse_file(dir.path().join("workspace.dsl")).unwrap();
        let workspace = parser.into_workspace().unwrap();
        let names: Vec<_> = workspace
            .model()
            .elements()
            .map(|element| element.name().to_owned())
            .collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn disabled_features_refuse_their_statements() {
        let mut parser = Parser::new();
        parser.disable_feature(Feature::Include);
        let err = parser
            .parse_str(
                r#"
                workspace {
                    model {
                        !include https://example.com/x.dsl
                    }
                }
                "#,
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::E400);
    }

    #[test]
    fn elements_blocks_apply_to_every_match() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    shop = softwareSystem "Shop" {
                        web = container "Web" "" "" "Database"
                        db = container "DB" "" "" "Database"
                        cache = container "Cache"
                    }
                    !elements element.tag==Database {
                        technology "PostgreSQL"
                    }
                }
            }
            "#,
        );
        let model = workspace.model();
        assert_eq!(element_named(model, "Web").technology(), "PostgreSQL");
        assert_eq!(element_named(model, "DB").technology(), "PostgreSQL");
        assert_eq!(element_named(model, "Cache").technology(), "");
    }

    #[test]
    fn elements_blocks_matching_nothing_are_an_error() {
        let err = parse_err(
            r#"
            workspace {
                model {
                    softwareSystem "Shop"
                    !elements element.tag==Ghost {
                        technology "None"
                    }
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E200);
    }

    #[test]
    fn relationships_blocks_apply_to_every_match() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    a = softwareSystem "A"
                    b = softwareSystem "B"
                    a -> b "Reads"
                    b -> a "Notifies"
                    !relationships * {
                        technology "gRPC"
                    }
                }
            }
            "#,
        );
        for relationship in workspace.model().relationships() {
            assert_eq!(relationship.technology(), "gRPC");
        }
    }

    #[test]
    fn mixed_expression_combinators_are_rejected() {
        let err = parse_err(
            r#"
            workspace {
                model {
                    softwareSystem "Shop"
                    !elements element.tag==A && element.tag==B || element.tag==C {
                        technology "None"
                    }
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E104);
    }
}

mod restricted_mode_tests {
    use super::*;

    fn restricted() -> Parser {
        let mut parser = Parser::new();
        parser.set_restricted(true);
        parser
    }

    #[test]
    fn file_includes_are_refused() {
        let err = restricted()
            .parse_str(
                r#"
                workspace {
                    model {
                        !include people.dsl
                    }
                }
                "#,
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::E401);
    }

    #[test]
    fn url_includes_remain_available() {
        let mut parser = restricted();
        parser.set_fetcher(Box::new(CannedFetcher::with(
            "https://example.com/people.dsl",
            "person \"Customer\"",
        )));
        parser
            .parse_str(
                r#"
                workspace {
                    model {
                        !include https://example.com/people.dsl
                    }
                }
                "#,
            )
            .unwrap();
        let workspace = parser.into_workspace().unwrap();
        assert!(
            workspace
                .model()
                .find_element_by_name(None, "Customer")
                .is_some()
        );
    }

    #[test]
    fn scripts_and_plugins_are_refused() {
        let err = restricted()
            .parse_str(
                r#"
                workspace {
                    !script groovy {
                    }
                }
                "#,
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::E401);

        let err = restricted()
            .parse_str(
                r#"
                workspace {
                    !plugin com.example.Plugin
                }
                "#,
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::E401);
    }

    #[test]
    fn environment_substitution_is_off() {
        // SAFETY: test processes are single-threaded at this point.
        unsafe { std::env::set_var("MAQUETTE_TEST_NAME", "FromEnv") };
        let mut parser = restricted();
        parser
            .parse_str(
                r#"
                workspace {
                    model {
                        softwareSystem "${MAQUETTE_TEST_NAME}"
                    }
                }
                "#,
            )
            .unwrap();
        let workspace = parser.into_workspace().unwrap();
        assert!(
            workspace
                .model()
                .find_element_by_name(None, "${MAQUETTE_TEST_NAME}")
                .is_some()
        );
    }
}

mod extension_tests {
    use super::*;

    #[test]
    fn inline_scripts_run_once_when_their_block_closes() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut parser = Parser::new();
        parser
            .extensions_mut()
            .register_script_engine("mock", Box::new(RecordingEngine { runs: runs.clone() }));
        parser
            .parse_str(
                r#"
                workspace {
                    !script mock {
                        workspace.setName("Scripted")
                    }
                }
                "#,
            )
            .unwrap();
        let runs = runs.borrow();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].0, "workspace.setName(\"Scripted\")");
    }

    #[test]
    fn external_scripts_collect_parameters_before_running() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut parser = Parser::new();
        parser
            .extensions_mut()
            .register_script_engine("kts", Box::new(RecordingEngine { runs: runs.clone() }));
        parser.set_fetcher(Box::new(CannedFetcher::with(
            "https://example.com/setup.kts",
            "println(target)",
        )));
        parser
            .parse_str(
                r#"
                workspace {
                    !script https://example.com/setup.kts {
                        target "production"
                        region "eu-west-1"
                    }
                }
                "#,
            )
            .unwrap();
        let runs = runs.borrow();
        assert_eq!(runs.len(), 1);
        let (source, parameters, _) = &runs[0];
        assert_eq!(source, "println(target)");
        assert_eq!(*parameters, 2);
    }

    #[test]
    fn scripts_inside_element_blocks_see_the_element() {
        let runs = Rc::new(RefCell::new(Vec::new()));
        let mut parser = Parser::new();
        parser
            .extensions_mut()
            .register_script_engine("mock", Box::new(RecordingEngine { runs: runs.clone() }));
        parser
            .parse_str(
                r#"
                workspace {
                    model {
                        softwareSystem "Shop" {
                            !script mock {
                                element.addTags("scripted")
                            }
                        }
                    }
                }
                "#,
            )
            .unwrap();
        assert!(runs.borrow()[0].2, "the element binding should be set");
    }

    #[test]
    fn plugins_receive_their_parameters() {
        let mut parser = Parser::new();
        parser
            .extensions_mut()
            .register_plugin("rename", Box::new(RenamePlugin));
        parser
            .parse_str(
                r#"
                workspace "Before" {
                    !plugin rename {
                        name "After"
                    }
                }
                "#,
            )
            .unwrap();
        assert_eq!(parser.workspace().unwrap().name(), "After");
    }

    #[test]
    fn unknown_plugins_are_reported() {
        let err = parse_err(
            r#"
            workspace {
                !plugin missing
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E204);
    }

    #[test]
    fn component_finders_create_and_register_components() {
        let mut parser = Parser::new();
        parser
            .extensions_mut()
            .register_component_finder("static", Box::new(DirectiveFinder));
        parser
            .parse_str(
                r#"
                workspace {
                    model {
                        shop = softwareSystem "Shop" {
                            api = container "API" {
                                !components static {
                                    component "Orders"
                                    component "Billing"
                                }
                            }
                        }
                        !elements element.type==Component {
                            technology "Rust"
                        }
                    }
                }
                "#,
            )
            .unwrap();
        let workspace = parser.into_workspace().unwrap();
        let model = workspace.model();
        let api = element_named(model, "API").id();
        assert_eq!(model.children(api).count(), 2);
        assert_eq!(element_named(model, "Orders").technology(), "Rust");
    }
}

mod view_tests {
    use super::*;

    const MODEL: &str = r#"
        model {
            customer = person "Customer"
            shop = softwareSystem "Shop" {
                web = container "Web"
                db = container "Database"
                web -> db "Queries"
            }
            customer -> web "Uses"
        }
    "#;

    #[test]
    fn declares_views_with_keys_and_content() {
        let workspace = parse(&format!(
            r#"
            workspace {{
                {MODEL}
                views {{
                    systemContext shop "Context" "The big picture" {{
                        include *
                        autoLayout lr 100 200
                        default
                    }}
                }}
            }}
            "#
        ));
        let views = workspace.views();
        let id = views.find_view_by_key("Context").expect("view should exist");
        let view = views.view(id);
        assert_eq!(view.description(), "The big picture");

        let model = workspace.model();
        let shop = model.find_element_by_name(None, "Shop").unwrap();
        let customer = model.find_element_by_name(None, "Customer").unwrap();
        assert!(view.contains(shop));
        assert!(view.contains(customer));

        let layout = view.auto_layout().expect("autoLayout should be set");
        assert_eq!(layout.rank_separation, 100);
        assert_eq!(layout.node_separation, 200);
        assert_eq!(views.default_view(), Some(id));
    }

    #[test]
    fn generates_keys_when_none_are_given() {
        let workspace = parse(&format!(
            r#"
            workspace {{
                {MODEL}
                views {{
                    systemLandscape {{
                        include *
                    }}
                    systemLandscape {{
                        include *
                    }}
                }}
            }}
            "#
        ));
        let keys: Vec<_> = workspace
            .views()
            .views()
            .map(|view| view.key().to_owned())
            .collect();
        assert_eq!(keys.len(), 2);
        assert!(keys[0].starts_with("SystemLandscape-"));
        assert_ne!(keys[0], keys[1]);
    }

    #[test]
    fn duplicate_view_keys_are_rejected() {
        let err = parse_err(&format!(
            r#"
            workspace {{
                {MODEL}
                views {{
                    systemContext shop "Context" {{
                    }}
                    container shop "Context" {{
                    }}
                }}
            }}
            "#
        ));
        assert_eq!(err.code(), ErrorCode::E506);
    }

    #[test]
    fn include_accepts_expressions_and_exclude_removes() {
        let workspace = parse(&format!(
            r#"
            workspace {{
                {MODEL}
                views {{
                    container shop "Containers" {{
                        include element.type==Container
                        exclude db
                    }}
                }}
            }}
            "#
        ));
        let views = workspace.views();
        let view = views.view(views.find_view_by_key("Containers").unwrap());
        let model = workspace.model();
        assert!(view.contains(element_named(model, "Web").id()));
        assert!(!view.contains(element_named(model, "Database").id()));
    }

    #[test]
    fn exclude_arrow_expressions_remove_relationships() {
        let workspace = parse(&format!(
            r#"
            workspace {{
                {MODEL}
                views {{
                    container shop "Containers" {{
                        include *
                        exclude * -> *
                    }}
                }}
            }}
            "#
        ));
        let views = workspace.views();
        let view = views.view(views.find_view_by_key("Containers").unwrap());
        assert!(view.relationships_in(workspace.model()).is_empty());
    }

    #[test]
    fn animations_require_included_elements() {
        let workspace = parse(&format!(
            r#"
            workspace {{
                {MODEL}
                views {{
                    systemContext shop "Context" {{
                        include *
                        animation {{
                            customer
                            shop
                        }}
                    }}
                }}
            }}
            "#
        ));
        let views = workspace.views();
        let view = views.view(views.find_view_by_key("Context").unwrap());
        assert_eq!(view.animations().len(), 2);

        let err = parse_err(&format!(
            r#"
            workspace {{
                {MODEL}
                views {{
                    systemContext shop "Context" {{
                        animation {{
                            customer
                        }}
                    }}
                }}
            }}
            "#
        ));
        assert_eq!(err.code(), ErrorCode::E200);
    }

    #[test]
    fn deployment_views_resolve_their_environment() {
        let workspace = parse(
            r#"
            workspace {
                model {
                    a = softwareSystem "A"
                    deploymentEnvironment "Production" {
                        deploymentNode "Server" {
                            softwareSystemInstance a
                        }
                    }
                }
                views {
                    deployment * "Production" "Deploy" {
                        include *
                    }
                }
            }
            "#,
        );
        let views = workspace.views();
        let view = views.view(views.find_view_by_key("Deploy").unwrap());
        let environment = element_named(workspace.model(), "Production").id();
        assert_eq!(view.environment(), Some(environment));
    }

    #[test]
    fn image_views_require_content() {
        let mut parser = Parser::new();
        parser.set_fetcher(Box::new(CannedFetcher::with(
            "https://example.com/diagram.puml",
            "@startuml\n@enduml",
        )));
        parser
            .parse_str(
                r#"
                workspace {
                    model {
                        a = softwareSystem "A"
                    }
                    views {
                        image a "Imported" {
                            plantuml https://example.com/diagram.puml
                        }
                    }
                }
                "#,
            )
            .unwrap();
        let workspace = parser.into_workspace().unwrap();
        let views = workspace.views();
        let view = views.view(views.find_view_by_key("Imported").unwrap());
        let image = view.image().expect("image content should be set");
        assert_eq!(image.content_type, "text/x-plantuml");
        assert!(image.content.contains("@startuml"));

        let err = parse_err(
            r#"
            workspace {
                model {
                    a = softwareSystem "A"
                }
                views {
                    image a "Empty" {
                    }
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E101);
    }
}

mod style_tests {
    use super::*;

    #[test]
    fn element_and_relationship_styles_are_collected() {
        let workspace = parse(
            r#"
            workspace {
                views {
                    styles {
                        element "Database" {
                            shape cylinder
                            background #1168bd
                            opacity 80
                            metadata false
                        }
                        relationship "Async" {
                            style dashed
                            routing curved
                            thickness 2
                        }
                    }
                    theme https://example.com/theme.json
                }
            }
            "#,
        );
        let styles = workspace.views().styles();
        let element_style = &styles.element_styles()[0];
        assert_eq!(element_style.tag, "Database");
        assert!(element_style.shape.is_some());
        assert!(element_style.background.is_some());
        assert_eq!(element_style.opacity, Some(80));
        assert_eq!(element_style.metadata, Some(false));

        let relationship_style = &styles.relationship_styles()[0];
        assert_eq!(relationship_style.tag, "Async");
        assert!(relationship_style.style.is_some());
        assert!(relationship_style.routing.is_some());
        assert_eq!(relationship_style.thickness, Some(2));

        assert_eq!(styles.themes(), ["https://example.com/theme.json"]);
    }

    #[test]
    fn invalid_style_values_are_rejected() {
        let err = parse_err(
            r#"
            workspace {
                views {
                    styles {
                        element "Database" {
                            background notacolor
                        }
                    }
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E103);

        let err = parse_err(
            r#"
            workspace {
                views {
                    styles {
                        element "Database" {
                            opacity 150
                        }
                    }
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E103);
    }

    #[test]
    fn duplicate_style_tags_are_rejected() {
        let err = parse_err(
            r#"
            workspace {
                views {
                    styles {
                        element "Database" {
                        }
                        element "Database" {
                        }
                    }
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E506);
    }

    #[test]
    fn branding_sets_logo_and_font() {
        let workspace = parse(
            r#"
            workspace {
                views {
                    branding {
                        logo https://example.com/logo.png
                        font "Open Sans" https://example.com/font.css
                    }
                }
            }
            "#,
        );
        let branding = workspace.views().branding();
        assert_eq!(branding.logo(), Some("https://example.com/logo.png"));
        assert_eq!(branding.font().unwrap().name, "Open Sans");
    }
}

mod structure_tests {
    use super::*;

    #[test]
    fn missing_closing_braces_name_the_open_block() {
        let err = parse_err("workspace {\n    model {\n");
        assert_eq!(err.code(), ErrorCode::E500);
        assert!(err.message().contains("model"));
    }

    #[test]
    fn stray_closing_braces_are_rejected() {
        let err = parse_err("workspace {\n}\n}\n");
        assert_eq!(err.code(), ErrorCode::E501);
    }

    #[test]
    fn unterminated_block_comments_are_rejected() {
        let err = parse_err("workspace {\n/* never closed\n}\n");
        assert_eq!(err.code(), ErrorCode::E002);
    }

    #[test]
    fn comments_are_ignored() {
        let workspace = parse(
            r#"
            workspace {
                // a line comment
                # another line comment
                /* a block
                   comment */
                model {
                    softwareSystem "Shop"
                }
            }
            "#,
        );
        assert_eq!(workspace.model().elements().count(), 1);
    }

    #[test]
    fn unterminated_quotes_are_rejected() {
        let err = parse_err("workspace \"Shop {\n}\n");
        assert_eq!(err.code(), ErrorCode::E001);
    }

    #[test]
    fn blocks_are_only_opened_by_block_statements() {
        let err = parse_err(
            r#"
            workspace {
                name "Shop" {
                }
            }
            "#,
        );
        assert_eq!(err.code(), ErrorCode::E300);
    }

    #[test]
    fn continuation_lines_join() {
        let workspace = parse(
            "workspace {\n    model {\n        softwareSystem \\\n            \"Shop\"\n    }\n}\n",
        );
        assert!(
            workspace
                .model()
                .find_element_by_name(None, "Shop")
                .is_some()
        );
    }
}
