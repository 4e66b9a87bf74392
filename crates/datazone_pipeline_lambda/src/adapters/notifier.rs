use super::block_on;

pub trait Notifier {
    /// Publishes a message and returns the broker-assigned message id.
    fn publish(&self, topic_arn: &str, subject: &str, message: &str)
        -> Result<Option<String>, String>;
}

pub struct SnsNotifier {
    sns_client: aws_sdk_sns::Client,
}

impl SnsNotifier {
    pub fn new(sns_client: aws_sdk_sns::Client) -> Self {
        Self { sns_client }
    }
}

impl Notifier for SnsNotifier {
    fn publish(
        &self,
        topic_arn: &str,
        subject: &str,
        message: &str,
    ) -> Result<Option<String>, String> {
        let request = self
            .sns_client
            .publish()
            .topic_arn(topic_arn)
            .subject(subject)
            .message(message);

        block_on(request.send())
            .map(|output| output.message_id().map(str::to_string))
            .map_err(|error| {
                format!(
                    "failed to publish to {topic_arn}: {}",
                    aws_sdk_sns::error::DisplayErrorContext(&error)
                )
            })
    }
}
