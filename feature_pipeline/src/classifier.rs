//Copyright 2024 Felix Engl
//
//Licensed under the Apache License, Version 2.0 (the "License");
//you may not use this file except in compliance with the License.
//You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
//Unless required by applicable law or agreed to in writing, software
//distributed under the License is distributed on an "AS IS" BASIS,
//WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//See the License for the specific language governing permissions and
//limitations under the License.

use text_processing::vectorizer::FeatureVector;
use crate::table::FeatureTable;

/// A model consuming the assembled feature tables.
#[cfg_attr(test, mockall::automock(type Label = String; type Error = std::io::Error;))]
pub trait Classifier {
    type Label;
    type Error: std::error::Error;

    fn fit(&mut self, x: &[FeatureVector], y: &[Self::Label]) -> Result<(), Self::Error>;

    fn predict(&self, x: &[FeatureVector]) -> Result<Vec<Self::Label>, Self::Error>;
}

/// Fits [classifier] on every row of [table].
pub fn train_on<C: Classifier>(table: &FeatureTable<C::Label>, classifier: &mut C) -> Result<(), C::Error> {
    classifier.fit(table.features(), table.labels())
}

/// The share of rows in [table] predicted correctly by [classifier].
pub fn accuracy<C>(table: &FeatureTable<C::Label>, classifier: &C) -> Result<f64, C::Error>
where
    C: Classifier,
    C::Label: PartialEq
{
    if table.is_empty() {
        return Ok(0.0)
    }
    let predicted = classifier.predict(table.features())?;
    let correct = predicted
        .iter()
        .zip(table.labels())
        .filter(|(a, b)| a == b)
        .count();
    Ok(correct as f64 / table.len() as f64)
}
