use super::{Bundle, CatalogEntry, CompletionRule, ComponentKind};
use crate::domain::PropertyMap;

const NIFI_GROUP: &str = "org.apache.nifi";

const QOS: &str = "Quality of Service(QoS)";

const SAMPLE_CONTENT: &str =
    r#"{"id": 1, "name": "sample", "value": 42.0, "timestamp": "2024-01-01T00:00:00Z"}"#;

struct Template {
    key: &'static str,
    kind: ComponentKind,
    type_name: &'static str,
    artifact: &'static str,
    description: &'static str,
    relationships: &'static [&'static str],
    defaults: &'static [(&'static str, &'static str)],
    rules: Vec<CompletionRule>,
}

fn processor(
    key: &'static str,
    type_name: &'static str,
    artifact: &'static str,
    description: &'static str,
    relationships: &'static [&'static str],
    defaults: &'static [(&'static str, &'static str)],
) -> Template {
    Template {
        key,
        kind: ComponentKind::Processor,
        type_name,
        artifact,
        description,
        relationships,
        defaults,
        rules: Vec::new(),
    }
}

fn service(
    key: &'static str,
    type_name: &'static str,
    artifact: &'static str,
    description: &'static str,
    defaults: &'static [(&'static str, &'static str)],
) -> Template {
    Template {
        key,
        kind: ComponentKind::ControllerService,
        type_name,
        artifact,
        description,
        relationships: &[],
        defaults,
        rules: Vec::new(),
    }
}

impl Template {
    fn with_rules(mut self, rules: Vec<CompletionRule>) -> Self {
        self.rules = rules;
        self
    }

    fn build(self, version: &str) -> CatalogEntry {
        CatalogEntry {
            key: self.key.to_string(),
            kind: self.kind,
            type_name: self.type_name.to_string(),
            bundle: Bundle {
                group: NIFI_GROUP.to_string(),
                artifact: self.artifact.to_string(),
                version: version.to_string(),
            },
            description: self.description.to_string(),
            relationships: self.relationships.iter().map(|r| r.to_string()).collect(),
            default_properties: self
                .defaults
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<PropertyMap>(),
            rules: self.rules,
        }
    }
}

const SUCCESS_FAILURE: &[&str] = &["success", "failure"];

pub(super) fn entries(version: &str) -> Vec<CatalogEntry> {
    let sink = || CompletionRule::terminate_when_sink(SUCCESS_FAILURE);

    let templates = vec![
        // Sources
        processor(
            "GenerateFlowFile",
            "org.apache.nifi.processors.standard.GenerateFlowFile",
            "nifi-standard-nar",
            "Generates flow files with fixed or random content; useful for testing",
            &["success"],
            &[("Batch Size", "1"), ("Data Format", "Text"), ("Unique FlowFiles", "false")],
        )
        .with_rules(vec![
            CompletionRule::ensure_non_empty("Custom Text", SAMPLE_CONTENT),
            CompletionRule::ensure("Data Format", "Text"),
        ]),
        processor(
            "GetFile",
            "org.apache.nifi.processors.standard.GetFile",
            "nifi-standard-nar",
            "Reads files from a local directory",
            &["success"],
            &[("Keep Source File", "false"), ("File Filter", "[^\\.].*")],
        ),
        processor(
            "ListenHTTP",
            "org.apache.nifi.processors.standard.ListenHTTP",
            "nifi-standard-nar",
            "Receives flow files over HTTP POST",
            &["success"],
            &[("Listening Port", "8081"), ("Base Path", "contentListener")],
        ),
        processor(
            "ConsumeKafka",
            "org.apache.nifi.processors.kafka.pubsub.ConsumeKafka_2_6",
            "nifi-kafka-2-6-nar",
            "Consumes messages from a Kafka topic",
            &["success"],
            &[
                ("bootstrap.servers", "localhost:9092"),
                ("auto.offset.reset", "latest"),
                ("group.id", "etlsmith"),
            ],
        ),
        processor(
            "ConsumeMQTT",
            "org.apache.nifi.processors.mqtt.ConsumeMQTT",
            "nifi-mqtt-nar",
            "Subscribes to an MQTT topic filter",
            &["Message"],
            &[("Broker URI", "tcp://localhost:1883"), ("Max Queue Size", "1000")],
        )
        .with_rules(vec![
            CompletionRule::ensure(QOS, "0"),
            CompletionRule::ensure("Max Queue Size", "1000"),
        ]),
        processor(
            "QueryDatabaseTable",
            "org.apache.nifi.processors.standard.QueryDatabaseTable",
            "nifi-standard-nar",
            "Incrementally fetches new rows from a database table",
            &["success"],
            &[("db-fetch-db-type", "Generic")],
        ),
        processor(
            "ExecuteSQL",
            "org.apache.nifi.processors.standard.ExecuteSQL",
            "nifi-standard-nar",
            "Runs a SQL select query and emits Avro results",
            &["success", "failure"],
            &[],
        ),
        // Transforms
        processor(
            "InvokeHTTP",
            "org.apache.nifi.processors.standard.InvokeHTTP",
            "nifi-standard-nar",
            "Calls an HTTP endpoint",
            &["Original", "Response", "Retry", "No Retry", "Failure"],
            &[("HTTP Method", "GET")],
        ),
        processor(
            "ConvertRecord",
            "org.apache.nifi.processors.standard.ConvertRecord",
            "nifi-standard-nar",
            "Converts records between formats using a reader and a writer service",
            SUCCESS_FAILURE,
            &[],
        ),
        processor(
            "UpdateAttribute",
            "org.apache.nifi.processors.attributes.UpdateAttribute",
            "nifi-update-attribute-nar",
            "Adds or updates flow file attributes",
            &["success"],
            &[],
        ),
        processor(
            "RouteOnAttribute",
            "org.apache.nifi.processors.standard.RouteOnAttribute",
            "nifi-standard-nar",
            "Routes flow files by attribute expressions; each dynamic property becomes a relationship",
            &["unmatched"],
            &[("Routing Strategy", "Route to Property name")],
        ),
        processor(
            "EvaluateJsonPath",
            "org.apache.nifi.processors.standard.EvaluateJsonPath",
            "nifi-standard-nar",
            "Extracts JSON fields into attributes or content",
            &["matched", "unmatched", "failure"],
            &[("Destination", "flowfile-attribute"), ("Return Type", "auto-detect")],
        ),
        processor(
            "SplitJson",
            "org.apache.nifi.processors.standard.SplitJson",
            "nifi-standard-nar",
            "Splits a JSON array into one flow file per element",
            &["split", "original", "failure"],
            &[("JsonPath Expression", "$.*")],
        ),
        processor(
            "MergeContent",
            "org.apache.nifi.processors.standard.MergeContent",
            "nifi-standard-nar",
            "Merges many flow files into one",
            &["merged", "original", "failure"],
            &[("Merge Strategy", "Bin-Packing Algorithm"), ("Minimum Number of Entries", "1")],
        ),
        processor(
            "ReplaceText",
            "org.apache.nifi.processors.standard.ReplaceText",
            "nifi-standard-nar",
            "Rewrites content with a regular expression",
            SUCCESS_FAILURE,
            &[("Replacement Strategy", "Regex Replace"), ("Evaluation Mode", "Entire text")],
        ),
        processor(
            "JoltTransformJSON",
            "org.apache.nifi.processors.standard.JoltTransformJSON",
            "nifi-standard-nar",
            "Reshapes JSON with a Jolt specification",
            SUCCESS_FAILURE,
            &[("jolt-transform", "jolt-transform-chain")],
        ),
        // Sinks
        processor(
            "LogAttribute",
            "org.apache.nifi.processors.standard.LogAttribute",
            "nifi-standard-nar",
            "Logs flow file attributes",
            &["success"],
            &[("Log Level", "info")],
        )
        .with_rules(vec![CompletionRule::terminate_when_sink(&["success"])]),
        processor(
            "PutFile",
            "org.apache.nifi.processors.standard.PutFile",
            "nifi-standard-nar",
            "Writes flow files to a local directory",
            SUCCESS_FAILURE,
            &[("Conflict Resolution Strategy", "replace"), ("Create Missing Directories", "true")],
        )
        .with_rules(vec![sink()]),
        processor(
            "PublishKafka",
            "org.apache.nifi.processors.kafka.pubsub.PublishKafka_2_6",
            "nifi-kafka-2-6-nar",
            "Publishes flow file content to a Kafka topic",
            SUCCESS_FAILURE,
            &[("bootstrap.servers", "localhost:9092"), ("acks", "all")],
        )
        .with_rules(vec![sink()]),
        processor(
            "PublishMQTT",
            "org.apache.nifi.processors.mqtt.PublishMQTT",
            "nifi-mqtt-nar",
            "Publishes flow file content to an MQTT topic",
            SUCCESS_FAILURE,
            &[("Broker URI", "tcp://localhost:1883")],
        )
        .with_rules(vec![
            CompletionRule::ensure(QOS, "0"),
            CompletionRule::ensure("Retain Message", "false"),
            sink(),
        ]),
        processor(
            "PutDatabaseRecord",
            "org.apache.nifi.processors.standard.PutDatabaseRecord",
            "nifi-standard-nar",
            "Writes records to a database table",
            &["success", "failure", "retry"],
            &[("put-db-record-statement-type", "INSERT")],
        )
        .with_rules(vec![CompletionRule::terminate_when_sink(&["success", "failure", "retry"])]),
        processor(
            "PutS3Object",
            "org.apache.nifi.processors.aws.s3.PutS3Object",
            "nifi-aws-nar",
            "Uploads flow file content to Amazon S3",
            SUCCESS_FAILURE,
            &[("Region", "us-east-1")],
        )
        .with_rules(vec![sink()]),
        // Controller services
        service(
            "DBCPConnectionPool",
            "org.apache.nifi.dbcp.DBCPConnectionPool",
            "nifi-dbcp-service-nar",
            "JDBC connection pool",
            &[("Max Total Connections", "8")],
        ),
        service(
            "JsonTreeReader",
            "org.apache.nifi.json.JsonTreeReader",
            "nifi-record-serialization-services-nar",
            "Reads JSON records",
            &[("schema-access-strategy", "infer-schema")],
        ),
        service(
            "JsonRecordSetWriter",
            "org.apache.nifi.json.JsonRecordSetWriter",
            "nifi-record-serialization-services-nar",
            "Writes records as JSON",
            &[("Schema Write Strategy", "no-schema"), ("schema-access-strategy", "inherit-record-schema")],
        ),
        service(
            "CSVReader",
            "org.apache.nifi.csv.CSVReader",
            "nifi-record-serialization-services-nar",
            "Reads CSV records",
            &[("schema-access-strategy", "csv-header-derived"), ("Skip Header Line", "true")],
        ),
        service(
            "CSVRecordSetWriter",
            "org.apache.nifi.csv.CSVRecordSetWriter",
            "nifi-record-serialization-services-nar",
            "Writes records as CSV",
            &[("schema-access-strategy", "inherit-record-schema")],
        ),
        service(
            "AvroReader",
            "org.apache.nifi.avro.AvroReader",
            "nifi-record-serialization-services-nar",
            "Reads Avro records with an embedded schema",
            &[("schema-access-strategy", "embedded-avro-schema")],
        ),
    ];

    templates.into_iter().map(|template| template.build(version)).collect()
}
