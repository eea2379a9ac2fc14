use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use bytes::Bytes;
use catalog_harvester::{
    BlobContainer, ConfigBacked, ContainerHandle, ContentSettings, Orchestrator, PipelineConfig,
    PipelineContext, PipelineResult, Prompter, RunOutcome, RunParams, RunSummary, StorageConfig,
    ratelimit::RatePolicy,
};
use httpmock::prelude::*;
use url::Url;

const CONTENT_TYPE: &str = "application/vnd.apache.parquet";

#[derive(Default)]
struct RecordingContainer {
    blobs: Mutex<BTreeMap<String, (Bytes, Option<String>)>>,
}

#[async_trait]
impl BlobContainer for RecordingContainer {
    async fn upload_bytes(
        &self,
        blob_name: &str,
        data: Bytes,
        settings: &ContentSettings,
    ) -> PipelineResult<()> {
        self.blobs
            .lock()
            .unwrap()
            .insert(blob_name.to_string(), (data, settings.content_type.clone()));
        Ok(())
    }

    async fn upload_from_url(
        &self,
        blob_name: &str,
        source: &Url,
        _overwrite: bool,
    ) -> PipelineResult<()> {
        self.blobs.lock().unwrap().insert(
            blob_name.to_string(),
            (Bytes::from(source.to_string()), None),
        );
        Ok(())
    }
}

struct FakeStorage {
    container: Arc<RecordingContainer>,
}

impl ConfigBacked for FakeStorage {
    fn storage_config(&self) -> PipelineResult<StorageConfig> {
        Ok(StorageConfig {
            connection_string: "UseDevelopmentStorage=true".to_string(),
            container_name: "nyc-tlc".to_string(),
            storage_path: String::new(),
            content_type: Some(CONTENT_TYPE.to_string()),
        })
    }

    fn resolve_container_handle(&self) -> PipelineResult<ContainerHandle> {
        Ok(self.container.clone())
    }
}

struct Answers(VecDeque<&'static str>);

impl Prompter for Answers {
    fn ask(&mut self, _question: &str) -> PipelineResult<String> {
        Ok(self.0.pop_front().unwrap_or_default().to_string())
    }
}

#[tokio::test]
async fn full_cycle_empties_data_dir_and_fills_container() {
    let server = MockServer::start_async().await;
    let files = [
        "yellow_tripdata_2021-01.parquet",
        "yellow_tripdata_2021-02.parquet",
        "yellow_tripdata_2022-01.parquet",
    ];
    let mut page = String::from("<html><body><table>");
    for name in files {
        page.push_str(&format!(
            "<tr><td><a href=\"{}\">{name}</a></td></tr>",
            server.url(format!("/trip-data/{name}"))
        ));
        server.mock(|when, then| {
            when.method(GET).path(format!("/trip-data/{name}"));
            then.status(200).body(format!("contents of {name}"));
        });
    }
    // Outside the year range and of the wrong type.
    page.push_str(
        "<a href=\"/trip-data/yellow_tripdata_2018-12.parquet\">x</a>\
         <a href=\"/misc/yellow_zone_lookup_2021.csv\">y</a>",
    );
    page.push_str("</table></body></html>");
    server.mock(|when, then| {
        when.method(GET).path("/catalog");
        then.status(200).body(page);
    });

    let data_dir = tempfile::tempdir().unwrap();
    let context = PipelineContext::new(PipelineConfig {
        page_url: server.url("/catalog"),
        data_dir: data_dir.path().to_path_buf(),
        rate_policy: RatePolicy::unlimited(),
        ..Default::default()
    })
    .unwrap();
    let container = Arc::new(RecordingContainer::default());
    let storage = FakeStorage {
        container: container.clone(),
    };
    let answers = Answers(VecDeque::from(["2021", "2022", "yellow", "y", "y"]));

    let mut orchestrator = Orchestrator::new(context, storage, answers);
    let outcome = orchestrator.run(RunParams::default()).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Completed(RunSummary {
            found: 3,
            downloaded: 3,
            uploaded: 3,
            failed: 0,
        })
    );
    assert_eq!(outcome.exit_code(), 0);
    assert!(std::fs::read_dir(data_dir.path()).unwrap().next().is_none());

    let blobs = container.blobs.lock().unwrap();
    assert_eq!(blobs.len(), 3);
    for name in files {
        let (data, content_type) = &blobs[name];
        assert_eq!(&data[..], format!("contents of {name}").as_bytes());
        assert_eq!(content_type.as_deref(), Some(CONTENT_TYPE));
    }
}
