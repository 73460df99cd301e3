use ctegraph_core::{build_lineage_from_sql, Dialect};

#[test]
fn single_cte_graph_json() {
    let graph = build_lineage_from_sql(
        "WITH b AS (SELECT * FROM a) SELECT * FROM b",
        Dialect::Bigquery,
    )
    .unwrap();

    insta::assert_json_snapshot!(graph, @r#"
    {
      "nodes": [
        {
          "id": "b",
          "type": "cte",
          "label": "b"
        },
        {
          "id": "a",
          "type": "table",
          "label": "a"
        },
        {
          "id": "(main)",
          "type": "query",
          "label": "(main)"
        }
      ],
      "edges": [
        {
          "id": "a->b",
          "source": "a",
          "target": "b"
        },
        {
          "id": "b->(main)",
          "source": "b",
          "target": "(main)"
        }
      ]
    }
    "#);
}
