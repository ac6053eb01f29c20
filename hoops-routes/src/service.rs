use crate::ServiceResult;
use crate::error::HoopServiceError;
use crate::metrics;
use error_stack::ResultExt;
use hoops_core::intake::{self, FormSubmission};
use hoops_core::model::{Hoop, HoopAttributes};
use hoops_core::{HoopEngine, Notifier};
use tracing::{Instrument, debug, error, info_span, instrument};

#[derive(Debug, Clone)]
pub struct HoopService<T> {
    engine: T,
}

impl<T> HoopService<T>
where
    T: HoopEngine,
{
    pub fn new(engine: T) -> Self {
        HoopService { engine }
    }

    /// Builds a hoop from the submission and saves it. Once the record is saved a
    /// notification is sent in the background.
    #[instrument(skip_all, name = "service#create")]
    pub async fn create(&self, submission: FormSubmission) -> ServiceResult<HoopAttributes> {
        let mut hoop = intake::intake(submission).change_context(HoopServiceError::Create)?;

        let outcome = hoop
            .save(&self.engine.media(), &self.engine.records())
            .await
            .change_context(HoopServiceError::Save)
            .attach_with(|| format!("hoop {}", hoop.id()))?;

        debug!("saved hoop {} ({outcome:?})", hoop.id());
        metrics::increment_hoops_submitted();
        metrics::record_media_outcome(outcome);

        self.notify(&hoop);

        Ok(hoop.into_attributes())
    }

    fn notify(&self, hoop: &Hoop) {
        let Some(notifier) = self.engine.notifier() else {
            return;
        };

        let attributes = hoop.attributes().clone();
        let span = info_span!("notify", hoop.id = %attributes.id);
        tokio::spawn(
            async move {
                if let Err(e) = notifier.notify(&attributes).await {
                    error!("failed to send new hoop notification: {e:?}");
                    metrics::increment_notifications_failed();
                }
            }
            .instrument(span),
        );
    }
}
