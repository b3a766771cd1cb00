//! Graphs for rule tests, built from inline JSON descriptions

use layerguard_core::config::default_layer_mappings;
use layerguard_core::LayerClassifier;
use layerguard_graph::{Description, Graph, GraphBuilder};

pub(crate) fn graph(json: &str) -> Graph {
    let description = Description::from_json(json).unwrap();
    GraphBuilder::new(LayerClassifier::new(&default_layer_mappings()).unwrap())
        .build_description(description)
        .unwrap()
}

/// The layered shop used across rule tests:
/// `domain/catalog` is pure, `domain/order` reaches into `usecase/dto` and uuid,
/// `interface/in/http` leaks `catalog.Product`, `interface/out/persistence`
/// declares a repository port, `usecase/catalog` has a service without context.
pub(crate) const SHOP: &str = r#"{
    "module": "example.com/shop",
    "packages": [
        {
            "path": "domain/catalog",
            "files": ["domain/catalog/product.go"],
            "types": ["Product", "Price"],
            "interfaces": [
                { "name": "ProductRepository", "location": { "file": "domain/catalog/repository.go", "line": 5 } }
            ],
            "references": [
                { "target": "errors", "file": "domain/catalog/product.go", "line": 4 },
                { "target": "time", "file": "domain/catalog/product.go", "line": 5 }
            ]
        },
        {
            "path": "domain/order",
            "files": ["domain/order/order.go"],
            "types": ["Order"],
            "references": [
                { "target": "github.com/google/uuid", "file": "domain/order/order.go", "line": 4 },
                { "target": "example.com/shop/usecase/dto", "file": "domain/order/order.go", "line": 6 },
                { "target": "example.com/shop/domain/catalog", "file": "domain/order/order.go", "line": 7 },
                { "target": "example.com/shop/usecase/dto", "kind": "type-reference", "file": "domain/order/order.go", "line": 12 }
            ]
        },
        {
            "path": "usecase/dto",
            "files": ["usecase/dto/product.go"],
            "types": ["ProductView", "OrderLine"],
            "references": [
                { "target": "example.com/shop/domain/catalog", "file": "usecase/dto/product.go", "line": 3 }
            ]
        },
        {
            "path": "usecase/catalog",
            "files": ["usecase/catalog/service.go"],
            "types": ["ProductService"],
            "functions": [
                {
                    "name": "Create",
                    "receiver": "ProductService",
                    "params": [ { "name": "ctx", "type": "context.Context" }, { "name": "in", "type": "dto.CreateProduct" } ],
                    "results": "(dto.ProductView, error)",
                    "location": { "file": "usecase/catalog/service.go", "line": 20 }
                },
                {
                    "name": "Count",
                    "receiver": "ProductService",
                    "params": [ { "name": "category", "type": "string" } ],
                    "results": "int",
                    "location": { "file": "usecase/catalog/service.go", "line": 30 }
                },
                {
                    "name": "count",
                    "receiver": "ProductService",
                    "location": { "file": "usecase/catalog/service.go", "line": 34 }
                }
            ],
            "references": [
                { "target": "context", "file": "usecase/catalog/service.go", "line": 4 },
                { "target": "example.com/shop/domain/catalog", "file": "usecase/catalog/service.go", "line": 6 },
                { "target": "example.com/shop/usecase/dto", "file": "usecase/catalog/service.go", "line": 7 }
            ]
        },
        {
            "path": "interface/in/http",
            "files": ["interface/in/http/handler.go"],
            "types": ["ProductHandler"],
            "functions": [
                {
                    "name": "Lookup",
                    "receiver": "ProductHandler",
                    "params": [ { "name": "id", "type": "string" } ],
                    "results": "(*catalog.Product, error)",
                    "type_refs": [ { "import_path": "example.com/shop/domain/catalog", "name": "Product" } ],
                    "location": { "file": "interface/in/http/handler.go", "line": 40 }
                },
                {
                    "name": "lookup",
                    "receiver": "ProductHandler",
                    "results": "*catalog.Product",
                    "type_refs": [ { "import_path": "example.com/shop/domain/catalog", "name": "Product" } ],
                    "location": { "file": "interface/in/http/handler.go", "line": 44 }
                }
            ],
            "references": [
                { "target": "net/http", "file": "interface/in/http/handler.go", "line": 5 },
                { "target": "example.com/shop/domain/catalog", "file": "interface/in/http/handler.go", "line": 7 },
                { "target": "example.com/shop/usecase/catalog", "file": "interface/in/http/handler.go", "line": 8 }
            ]
        },
        {
            "path": "interface/out/persistence",
            "files": ["interface/out/persistence/memory.go"],
            "types": ["MemoryStore"],
            "interfaces": [
                {
                    "name": "ProductRepository",
                    "methods": [
                        {
                            "name": "Save",
                            "receiver": "ProductRepository",
                            "params": [ { "name": "p", "type": "*catalog.Product" } ],
                            "results": "error"
                        }
                    ],
                    "location": { "file": "interface/out/persistence/memory.go", "line": 10 }
                }
            ],
            "functions": [
                {
                    "name": "Save",
                    "receiver": "MemoryStore",
                    "params": [ { "name": "ctx", "type": "context.Context" }, { "name": "p", "type": "*catalog.Product" } ],
                    "results": "error",
                    "type_refs": [ { "import_path": "example.com/shop/domain/catalog", "name": "Product" } ],
                    "location": { "file": "interface/out/persistence/memory.go", "line": 20 }
                }
            ],
            "references": [
                { "target": "example.com/shop/domain/catalog", "file": "interface/out/persistence/memory.go", "line": 6 }
            ]
        },
        {
            "path": "infrastructure/config",
            "files": ["infrastructure/config/config.go"],
            "references": [
                { "target": "os", "file": "infrastructure/config/config.go", "line": 3 }
            ]
        },
        {
            "path": "tools/seed",
            "files": ["tools/seed/seed.go"],
            "references": [
                { "target": "example.com/shop/domain/catalog", "file": "tools/seed/seed.go", "line": 3 }
            ]
        }
    ]
}"#;
