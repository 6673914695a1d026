//! ワークフローの実行ドライバ
//!
//! 状態機械が返した Effect を実行し、進行中のシーケンスを到着順に回収して
//! 完了イベントとして状態機械へ戻す。単一スレッドで協調的に動作し、
//! 進行中の呼び出しを中断することはない。

use super::pipeline::{analysis_pipeline, run_sequence, AnalysisPipeline};
use super::state::{AnalysisWorkflow, Effect, Event};
use crate::catalog::load_catalog;
use crate::services::{CatalogGateway, DescriptionService, LabelService};
use futures::future::LocalBoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::rc::Rc;
use tracing::debug;

pub struct Session {
    workflow: AnalysisWorkflow,
    pipeline: Rc<AnalysisPipeline>,
    in_flight: FuturesUnordered<LocalBoxFuture<'static, Event>>,
}

impl Session {
    pub fn new(
        workflow: AnalysisWorkflow,
        labels: Rc<dyn LabelService>,
        descriptions: Rc<dyn DescriptionService>,
    ) -> Self {
        Self {
            workflow,
            pipeline: Rc::new(analysis_pipeline(labels, descriptions)),
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn workflow(&self) -> &AnalysisWorkflow {
        &self.workflow
    }

    pub fn dispatch(&mut self, event: Event) {
        if let Some(effect) = self.workflow.handle(event) {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::StartAnalysis(request) => {
                debug!(upload = request.tag.upload, model = %request.tag.model, "sequence started");
                let pipeline = Rc::clone(&self.pipeline);
                self.in_flight
                    .push(async move { run_sequence(&*pipeline, request).await }.boxed_local());
            }
        }
    }

    pub fn upload(&mut self, data_url: impl Into<String>, byte_size: u64) {
        self.dispatch(Event::ImageUploaded {
            data_url: data_url.into(),
            byte_size,
        });
    }

    pub fn select_model(&mut self, model: impl Into<String>) {
        self.dispatch(Event::ModelSelected(model.into()));
    }

    /// カタログを取得してワークフローへ渡す（失敗もイベントとして渡す）
    pub async fn load_catalog(&mut self, gateway: &dyn CatalogGateway) {
        let event = match load_catalog(gateway).await {
            Ok(catalog) => Event::CatalogLoaded(catalog),
            Err(err) => Event::CatalogFailed(err.to_string()),
        };
        self.dispatch(event);
    }

    /// 進行中のシーケンス数（破棄予定のものを含む）
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// 次に完了したシーケンスを1件回収する。進行中がなければ false
    pub async fn step(&mut self) -> bool {
        match self.in_flight.next().await {
            Some(event) => {
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    /// 進行中のシーケンスがなくなるまで回収する
    pub async fn settle(&mut self) {
        while self.step().await {}
    }
}
