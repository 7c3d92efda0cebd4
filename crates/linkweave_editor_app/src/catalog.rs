// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node types available in the demo scene.

use linkweave_editor_graph::{NodeCatalog, NodeCategory, NodeType, Port, PortType};

/// Create the demo node catalog
pub fn create_demo_catalog() -> NodeCatalog {
    let mut catalog = NodeCatalog::new();

    catalog.register(NodeType {
        id: "constant".to_string(),
        name: "Constant".to_string(),
        category: NodeCategory::Input,
        inputs: vec![],
        outputs: vec![Port::output("Value", PortType::Float)],
    });

    catalog.register(NodeType {
        id: "add".to_string(),
        name: "Add".to_string(),
        category: NodeCategory::Math,
        inputs: vec![
            Port::input("A", PortType::Float),
            Port::input("B", PortType::Float),
        ],
        outputs: vec![Port::output("Result", PortType::Float)],
    });

    catalog.register(NodeType {
        id: "branch".to_string(),
        name: "Branch".to_string(),
        category: NodeCategory::Logic,
        inputs: vec![
            Port::input("Exec", PortType::Exec).with_multi_connect(true),
            Port::input("Condition", PortType::Bool),
        ],
        outputs: vec![
            Port::output("True", PortType::Exec),
            Port::output("False", PortType::Exec),
        ],
    });

    catalog.register(NodeType {
        id: "preview".to_string(),
        name: "Preview".to_string(),
        category: NodeCategory::Output,
        inputs: vec![Port::input("Color", PortType::Vector4)],
        outputs: vec![],
    });

    catalog
}
